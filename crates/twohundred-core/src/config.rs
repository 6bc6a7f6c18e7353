//! Table configuration supplied by the lobby.
//!
//! The engine only reads these values; deck variant, score target, kitty and
//! turn timeout are fixed for the lifetime of a game.

use crate::bot::BotSkill;
use crate::card::DeckVariant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score targets a table may choose from
pub const ALLOWED_SCORE_TARGETS: [i32; 4] = [200, 300, 500, 1000];

/// Errors raised when a table configuration is unusable
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Score target {0} is not one of 200, 300, 500, 1000")]
    ScoreTarget(i32),

    #[error("The kitty requires the 40-card deck")]
    KittyNeedsFullDeck,

    #[error("Turn timeout must be positive")]
    ZeroTimeout,

    #[error("Expected exactly 4 seats, got {0}")]
    SeatCount(usize),

    #[error("Bot seat {0} has no skill level")]
    MissingSkill(u8),
}

/// Rules and pacing for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub deck_variant: DeckVariant,
    pub score_target: i32,
    pub has_kitty: bool,
    /// Idle time allowed to the current player before the game is terminated
    pub timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_variant: DeckVariant::Short36,
            score_target: 200,
            has_kitty: false,
            timeout_ms: 60_000,
        }
    }
}

impl GameConfig {
    /// The 40-card game with the kitty enabled
    pub fn with_kitty(score_target: i32) -> Self {
        Self {
            deck_variant: DeckVariant::Full40,
            score_target,
            has_kitty: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ALLOWED_SCORE_TARGETS.contains(&self.score_target) {
            return Err(ConfigError::ScoreTarget(self.score_target));
        }
        if self.has_kitty && self.deck_variant != DeckVariant::Full40 {
            return Err(ConfigError::KittyNeedsFullDeck);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Whether rounds under this configuration deal a kitty
    pub fn kitty_enabled(&self) -> bool {
        self.has_kitty && self.deck_variant == DeckVariant::Full40
    }
}

/// Who sits in one seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    pub name: String,
    pub is_bot: bool,
    pub skill: Option<BotSkill>,
}

impl SeatConfig {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bot: false,
            skill: None,
        }
    }

    pub fn bot(name: impl Into<String>, skill: BotSkill) -> Self {
        Self {
            name: name.into(),
            is_bot: true,
            skill: Some(skill),
        }
    }
}

/// Check a full seating: exactly four seats, bots carry a skill
pub fn validate_seats(seats: &[SeatConfig]) -> Result<(), ConfigError> {
    if seats.len() != 4 {
        return Err(ConfigError::SeatCount(seats.len()));
    }
    for (idx, seat) in seats.iter().enumerate() {
        if seat.is_bot && seat.skill.is_none() {
            return Err(ConfigError::MissingSkill(idx as u8));
        }
    }
    Ok(())
}
