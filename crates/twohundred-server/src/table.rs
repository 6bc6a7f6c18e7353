//! A running game and who sits at it.

use std::time::{Duration, Instant};
use twohundred_core::player::SEATS;
use twohundred_core::{Bot, BotSkill, GameAction, GameError, GameEvent, GameState, Seat};
use uuid::Uuid;

/// A bot identity that outlives any single game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledBot {
    pub id: Uuid,
    pub name: String,
    pub skill: BotSkill,
}

impl PooledBot {
    pub fn new(skill: BotSkill) -> Self {
        let id = Uuid::new_v4();
        let tag = id.simple().to_string();
        Self {
            id,
            name: format!("{:?} Bot {}", skill, &tag[..4]),
            skill,
        }
    }
}

/// Whoever holds a seat
pub enum Occupant {
    Human(Uuid),
    Bot { identity: PooledBot, bot: Bot },
}

/// A game plus its seating, guarded by the registry's per-game lock
pub struct GameTable {
    pub id: Uuid,
    pub game: GameState,
    occupants: Vec<Occupant>,
    /// When each seat last became the one to act
    turn_started_at: [Instant; SEATS as usize],
    /// A bot driver loop is running for this game
    pub driving: bool,
}

impl GameTable {
    pub fn new(id: Uuid, game: GameState, occupants: Vec<Occupant>) -> Self {
        Self {
            id,
            game,
            occupants,
            turn_started_at: [Instant::now(); SEATS as usize],
            driving: false,
        }
    }

    /// Seat held by a human player
    pub fn seat_of(&self, player_id: Uuid) -> Option<Seat> {
        self.occupants
            .iter()
            .position(|o| matches!(o, Occupant::Human(id) if *id == player_id))
            .map(|i| i as Seat)
    }

    /// Human players and their seats
    pub fn humans(&self) -> Vec<(Uuid, Seat)> {
        self.occupants
            .iter()
            .enumerate()
            .filter_map(|(i, o)| match o {
                Occupant::Human(id) => Some((*id, i as Seat)),
                Occupant::Bot { .. } => None,
            })
            .collect()
    }

    pub fn is_bot_seat(&self, seat: Seat) -> bool {
        matches!(self.occupants.get(seat as usize), Some(Occupant::Bot { .. }))
    }

    /// The game is live and a bot is on turn
    pub fn is_bot_turn(&self) -> bool {
        !self.game.is_finished() && self.is_bot_seat(self.game.current_player)
    }

    /// Ask the bot on `seat` for its move
    pub fn bot_action(&mut self, seat: Seat) -> Result<Option<GameAction>, GameError> {
        match self.occupants.get_mut(seat as usize) {
            Some(Occupant::Bot { bot, .. }) => bot.choose_action(&self.game),
            _ => Ok(None),
        }
    }

    /// Apply an action and restart the clock for whoever acts next
    pub fn apply(&mut self, seat: Seat, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        let events = self.game.apply_action(seat, action)?;
        self.touch(Instant::now());
        Ok(events)
    }

    fn touch(&mut self, now: Instant) {
        let current = self.game.current_player as usize;
        if let Some(started) = self.turn_started_at.get_mut(current) {
            *started = now;
        }
    }

    /// How long the seat on turn has been idle
    pub fn idle_for(&self, now: Instant) -> Duration {
        let current = self.game.current_player as usize;
        self.turn_started_at
            .get(current)
            .map(|started| now.saturating_duration_since(*started))
            .unwrap_or_default()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.game.is_finished()
            && self.idle_for(now) >= Duration::from_millis(self.game.config.timeout_ms)
    }

    /// Hand back the bot identities so they can sit at another table
    pub fn take_bots(&mut self) -> Vec<PooledBot> {
        std::mem::take(&mut self.occupants)
            .into_iter()
            .filter_map(|o| match o {
                Occupant::Bot { identity, .. } => Some(identity),
                Occupant::Human(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twohundred_core::{GameConfig, SeatConfig};

    fn table() -> (GameTable, Uuid) {
        let human = Uuid::new_v4();
        let mut seats = vec![SeatConfig::human("Ana")];
        let mut occupants = vec![Occupant::Human(human)];
        for seat in 1..4 {
            let identity = PooledBot::new(BotSkill::Easy);
            seats.push(SeatConfig::bot(identity.name.clone(), BotSkill::Easy));
            occupants.push(Occupant::Bot {
                identity,
                bot: Bot::with_seed(seat, BotSkill::Easy, seat as u64),
            });
        }
        let mut game = GameState::with_seed(GameConfig::default(), seats, 2).unwrap();
        game.start().unwrap();
        (GameTable::new(Uuid::new_v4(), game, occupants), human)
    }

    #[test]
    fn test_seating() {
        let (table, human) = table();
        assert_eq!(table.seat_of(human), Some(0));
        assert_eq!(table.seat_of(Uuid::new_v4()), None);
        assert_eq!(table.humans(), vec![(human, 0)]);
        assert!(!table.is_bot_seat(0));
        assert!(table.is_bot_seat(3));
    }

    #[test]
    fn test_expiry_uses_current_seat_clock() {
        let (mut table, _) = table();
        let start = Instant::now();
        table.touch(start);

        let limit = Duration::from_millis(table.game.config.timeout_ms);
        assert!(!table.is_expired(start));
        assert!(table.is_expired(start + limit));
    }

    #[test]
    fn test_take_bots_returns_identities() {
        let (mut table, _) = table();
        let bots = table.take_bots();
        assert_eq!(bots.len(), 3);
        assert!(bots.iter().all(|b| b.skill == BotSkill::Easy));
    }
}
