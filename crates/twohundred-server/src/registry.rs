//! Active games, player routing and the bot pool.

use crate::config::ServerConfig;
use crate::protocol::ServerMessage;
use crate::table::{GameTable, PooledBot};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use twohundred_core::{BotSkill, ConfigError, ErrorKind, GameError};
use uuid::Uuid;

/// A table behind its single-writer lock
pub type SharedTable = Arc<Mutex<GameTable>>;

/// Messages queued for delivery once the table lock is released
pub type Outbox = Vec<(Uuid, ServerMessage)>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Game {0} not found")]
    GameNotFound(Uuid),

    #[error("Player {0} is not seated in this game")]
    PlayerNotSeated(Uuid),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::GameNotFound(_) | ServiceError::PlayerNotSeated(_) => ErrorKind::NotFound,
            ServiceError::Game(e) => e.kind(),
            ServiceError::Config(_) => ErrorKind::InvalidAction,
        }
    }
}

/// Server state shared across all tasks.
pub struct GameRegistry {
    pub config: ServerConfig,
    /// All active games
    games: DashMap<Uuid, SharedTable>,
    /// Mapping from player ID to their game ID
    player_games: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Bots waiting for a table
    bot_pool: DashMap<Uuid, PooledBot>,
}

impl GameRegistry {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            games: DashMap::new(),
            player_games: DashMap::new(),
            player_senders: DashMap::new(),
            bot_pool: DashMap::new(),
        }
    }

    /// Register a client and get the stream of messages addressed to it
    pub fn connect(&self, player_id: Uuid) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.player_senders.insert(player_id, tx);
        rx
    }

    pub fn disconnect(&self, player_id: Uuid) {
        self.player_senders.remove(&player_id);
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    pub fn deliver(&self, outbox: Outbox) {
        for (player_id, msg) in outbox {
            self.send_to_player(player_id, msg);
        }
    }

    pub fn insert(&self, table: GameTable) -> SharedTable {
        let game_id = table.id;
        for (player_id, _) in table.humans() {
            self.player_games.insert(player_id, game_id);
        }
        let shared = Arc::new(Mutex::new(table));
        self.games.insert(game_id, Arc::clone(&shared));
        shared
    }

    pub fn get(&self, game_id: Uuid) -> Result<SharedTable, ServiceError> {
        self.games
            .get(&game_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ServiceError::GameNotFound(game_id))
    }

    pub fn contains(&self, game_id: Uuid) -> bool {
        self.games.contains_key(&game_id)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn game_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_games.get(&player_id).map(|entry| *entry.value())
    }

    /// Snapshot of every active game, so callers never hold map guards
    pub fn tables(&self) -> Vec<(Uuid, SharedTable)> {
        self.games
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Take a game out of play. Only the first caller gets `true`.
    pub fn remove(&self, game_id: Uuid) -> bool {
        self.games.remove(&game_id).is_some()
    }

    /// Send humans back to the lobby and bots back to the pool.
    /// Returns the humans that were seated.
    pub fn release_seats(&self, table: &mut GameTable) -> Vec<Uuid> {
        let humans: Vec<Uuid> = table.humans().into_iter().map(|(id, _)| id).collect();
        for player_id in &humans {
            self.player_games
                .remove_if(player_id, |_, game_id| *game_id == table.id);
        }
        for bot in table.take_bots() {
            self.bot_pool.insert(bot.id, bot);
        }
        humans
    }

    /// A pooled bot of `skill`, or a fresh one if none is free
    pub fn take_bot(&self, skill: BotSkill) -> PooledBot {
        let free = self
            .bot_pool
            .iter()
            .find(|entry| entry.skill == skill)
            .map(|entry| *entry.key());

        free.and_then(|id| self.bot_pool.remove(&id))
            .map(|(_, bot)| bot)
            .unwrap_or_else(|| PooledBot::new(skill))
    }

    pub fn pool_size(&self) -> usize {
        self.bot_pool.len()
    }
}
