//! Twohundred - round engine for the partnership trick-taking game 200
//!
//! This crate provides the core game logic, including:
//! - Cards, the 36- and 40-card decks, and point values
//! - The auction, with passing and the 100-point ceiling
//! - The optional kitty exchange
//! - Trick play with follow-suit and trump resolution
//! - Round scoring, anti-runaway and game-end detection
//! - Bots at four skill levels
//!
//! # Architecture
//!
//! The game engine is synchronous and platform-agnostic. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for a single in-browser table
//!
//! Every state change goes through [`GameState::apply_action`].
//!
//! # Modules
//!
//! - [`card`]: Suits, ranks, decks
//! - [`bidding`]: Auction state and termination
//! - [`kitty`]: Dealing and the kitty exchange
//! - [`trick`]: Follow-suit legality and trick winners
//! - [`scoring`]: Round deltas and the winner check
//! - [`game`]: Game state machine
//! - [`bot`]: AI players
//! - [`belief`]: Card-location tracking for the expert bot

pub mod actions;
pub mod belief;
pub mod bidding;
pub mod bot;
pub mod card;
pub mod config;
pub mod game;
pub mod kitty;
pub mod player;
pub mod scoring;
pub mod trick;
pub mod view;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, RedealReason};
pub use belief::{Belief, Observation};
pub use bidding::{Bid, BiddingState, BID_STEP, MAX_BID, MIN_BID};
pub use bot::{BidDecision, Bot, BotSkill, PlayStrategy, Strategy};
pub use card::{Card, Deck, DeckVariant, Rank, Suit};
pub use config::{ConfigError, GameConfig, SeatConfig};
pub use game::{ErrorKind, GameError, GamePhase, GameState};
pub use kitty::KittyState;
pub use player::{Player, Seat, Team};
pub use scoring::{game_winner, score_round, RoundScore, RoundTally};
pub use trick::{CompletedTrick, Trick};
pub use view::PlayerView;
