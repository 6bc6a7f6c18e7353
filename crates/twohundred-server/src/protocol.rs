//! Outbound messages for seated clients.
//!
//! The transport that carries these is outside this crate; every message
//! serializes as `{"type": "...", "payload": {...}}`.

use serde::{Deserialize, Serialize};
use twohundred_core::{
    Bid, Card, CompletedTrick, ErrorKind, GameEvent, GamePhase, GameState, PlayerView,
    RoundScore, Seat, Suit, Team,
};
use uuid::Uuid;

/// Why a game stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A team crossed the score target
    ScoreTarget,
    /// A human left the table
    InsufficientPlayers,
    /// The engine detected broken bookkeeping
    Aborted,
}

/// Public table state, safe to show every seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub phase: GamePhase,
    pub current_player: Seat,
    pub dealer: Seat,
    pub round: u32,
    pub current_bid: Option<Bid>,
    pub trump: Option<Suit>,
    pub contractor: Option<Team>,
    pub team_scores: [i32; 2],
}

impl TableSummary {
    pub fn of(game: &GameState) -> Self {
        Self {
            phase: game.phase,
            current_player: game.current_player,
            dealer: game.dealer,
            round: game.round,
            current_bid: game.current_bid(),
            trump: game.trump,
            contractor: game.contractor,
            team_scores: game.team_scores,
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A bid was accepted; a pass is a bid of 0 with no suit
    BidMade {
        game_id: Uuid,
        seat: Seat,
        points: u32,
        suit: Option<Suit>,
    },

    /// Phase change, new deal or other table-wide refresh
    GameUpdated { game_id: Uuid, table: TableSummary },

    CardPlayed { game_id: Uuid, seat: Seat, card: Card },

    TrickCompleted {
        game_id: Uuid,
        trick: CompletedTrick,
        team: Team,
        round_points: [u32; 2],
    },

    RoundCompleted {
        game_id: Uuid,
        round: u32,
        score: RoundScore,
        team_scores: [i32; 2],
    },

    GameEnded {
        game_id: Uuid,
        reason: EndReason,
        winner: Option<Team>,
        team_scores: [i32; 2],
    },

    /// The seat on turn sat idle too long and the game was closed
    GameTimeout { game_id: Uuid, idle_seat: Seat },

    /// Sent only to the client whose action failed
    ActionRejected {
        game_id: Uuid,
        kind: ErrorKind,
        message: String,
    },

    /// What the receiving seat is allowed to see
    StateSnapshot { game_id: Uuid, view: PlayerView },
}

impl ServerMessage {
    /// Translate an engine event into the message broadcast to the table.
    ///
    /// `game` is the state after the batch that produced `event`.
    pub fn from_event(game_id: Uuid, event: &GameEvent, game: &GameState) -> Self {
        match event {
            GameEvent::BidMade { seat, points, suit } => ServerMessage::BidMade {
                game_id,
                seat: *seat,
                points: *points,
                suit: Some(*suit),
            },
            GameEvent::Passed { seat } => ServerMessage::BidMade {
                game_id,
                seat: *seat,
                points: 0,
                suit: None,
            },
            GameEvent::CardPlayed { seat, card } => ServerMessage::CardPlayed {
                game_id,
                seat: *seat,
                card: *card,
            },
            GameEvent::TrickCompleted {
                trick,
                team,
                round_points,
            } => ServerMessage::TrickCompleted {
                game_id,
                trick: trick.clone(),
                team: *team,
                round_points: *round_points,
            },
            GameEvent::RoundCompleted {
                round,
                score,
                team_scores,
            } => ServerMessage::RoundCompleted {
                game_id,
                round: *round,
                score: *score,
                team_scores: *team_scores,
            },
            GameEvent::GameEnded {
                winner,
                team_scores,
            } => ServerMessage::GameEnded {
                game_id,
                reason: EndReason::ScoreTarget,
                winner: Some(*winner),
                team_scores: *team_scores,
            },
            GameEvent::RoundStarted { .. }
            | GameEvent::BiddingWon { .. }
            | GameEvent::KittyTaken { .. }
            | GameEvent::KittyDiscarded { .. }
            | GameEvent::PlayStarted { .. } => ServerMessage::GameUpdated {
                game_id,
                table: TableSummary::of(game),
            },
        }
    }
}
