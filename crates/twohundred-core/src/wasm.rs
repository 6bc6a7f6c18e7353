//! WebAssembly bindings for the 200 engine.
//!
//! Exposes a single in-browser table to JavaScript through wasm-bindgen.
//! Seats marked as bots in the seat config are driven by `runBots`.

use wasm_bindgen::prelude::*;

use crate::actions::{GameAction, GameEvent};
use crate::bot::{Bot, BotSkill};
use crate::config::{GameConfig, SeatConfig};
use crate::game::GameState;
use crate::player::Seat;

/// Upper bound on bot actions per `runBots` call
const MAX_BOT_STEPS: usize = 512;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_err(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
    bots: Vec<Bot>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create and deal a game from a `GameConfig` and four `SeatConfig`s as JSON
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seats_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig =
            serde_json::from_str(config_json).map_err(|e| js_err("Invalid config", e))?;
        let seats: Vec<SeatConfig> =
            serde_json::from_str(seats_json).map_err(|e| js_err("Invalid seats", e))?;

        let bots = seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_bot)
            .map(|(i, s)| Bot::new(i as Seat, s.skill.unwrap_or(BotSkill::Medium)))
            .collect();

        let mut state = GameState::new(config, seats).map_err(|e| js_err("Invalid game", e))?;
        state.start().map_err(|e| js_err("Could not deal", e))?;

        Ok(WasmGame { state, bots })
    }

    /// What `seat` can see, as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, seat: u8) -> String {
        self.state
            .view_for(seat)
            .and_then(|view| serde_json::to_string(&view).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Get the seat expected to act
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.state.current_player
    }

    /// Get valid actions for a seat as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self, seat: u8) -> String {
        let actions = self.state.valid_actions(seat);
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, seat: u8, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction =
            serde_json::from_str(action_json).map_err(|e| js_err("Invalid action JSON", e))?;

        let events = self
            .state
            .apply_action(seat, action)
            .map_err(|e| js_err("Action failed", e))?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Let bots act until a human must move or the game ends.
    /// Returns every event produced, as JSON.
    #[wasm_bindgen(js_name = runBots)]
    pub fn run_bots(&mut self) -> Result<String, JsValue> {
        let mut events: Vec<GameEvent> = Vec::new();

        for _ in 0..MAX_BOT_STEPS {
            if self.state.is_finished() {
                break;
            }
            let seat = self.state.current_player;
            let Some(bot) = self.bots.iter_mut().find(|b| b.seat == seat) else {
                break;
            };
            let Some(action) = bot
                .choose_action(&self.state)
                .map_err(|e| js_err("Bot failed", e))?
            else {
                break;
            };
            let produced = self
                .state
                .apply_action(seat, action)
                .map_err(|e| js_err("Bot action rejected", e))?;
            events.extend(produced);
        }

        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Winning team index (0 or 1) once the game is finished
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.state.winner().map(|team| team.index() as u8)
    }

    /// Cumulative team scores
    #[wasm_bindgen(js_name = getTeamScores)]
    pub fn get_team_scores(&self) -> Vec<i32> {
        self.state.team_scores.to_vec()
    }

    /// Get the current phase as a string
    #[wasm_bindgen(js_name = getPhase)]
    pub fn get_phase(&self) -> String {
        serde_json::to_string(&self.state.phase).unwrap_or_else(|_| "\"Unknown\"".to_string())
    }
}
