//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the events
//! that result from those actions.

use crate::bidding::Bid;
use crate::card::{Card, Suit};
use crate::player::{Seat, Team};
use crate::scoring::RoundScore;
use crate::trick::CompletedTrick;
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Bidding ====================
    /// Bid for the contract, naming a trump. `points == 0` is a pass.
    Bid { points: u32, suit: Option<Suit> },
    /// Drop out of the auction for the rest of the round
    Pass,

    // ==================== Kitty ====================
    /// Pick up the kitty (bid winner only)
    TakeKitty,
    /// Bury four cards and fix trump
    DiscardToKitty { cards: Vec<Card>, trump: Suit },

    // ==================== Trick Play ====================
    PlayCard(Card),
}

/// Why a new deal happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedealReason {
    /// Previous round was scored
    RoundScored,
    /// Nobody bid
    AllPassed,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new round was dealt and bidding opened
    RoundStarted {
        round: u32,
        dealer: Seat,
        first_bidder: Seat,
        reason: Option<RedealReason>,
    },

    /// A bid was accepted
    BidMade { seat: Seat, points: u32, suit: Suit },

    /// A player passed
    Passed { seat: Seat },

    /// The auction closed
    BiddingWon { bid: Bid, contractor: Team },

    /// The bid winner picked up the kitty
    KittyTaken { seat: Seat, cards: usize },

    /// The bid winner buried four cards and named trump
    KittyDiscarded { seat: Seat, trump: Suit },

    /// Trick play began
    PlayStarted { leader: Seat, trump: Suit },

    /// A card was played to the current trick
    CardPlayed { seat: Seat, card: Card },

    /// The fourth card was played and the trick resolved
    TrickCompleted {
        trick: CompletedTrick,
        team: Team,
        round_points: [u32; 2],
    },

    /// All hands are empty and the round was scored
    RoundCompleted {
        round: u32,
        score: RoundScore,
        team_scores: [i32; 2],
    },

    /// A team reached the score target
    GameEnded { winner: Team, team_scores: [i32; 2] },
}
