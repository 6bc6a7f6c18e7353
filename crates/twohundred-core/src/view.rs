//! Per-player view of a game.
//!
//! Clients only ever receive this: their own hand, the size of everyone
//! else's, and the public table state. The kitty is shown as a count.

use crate::bidding::Bid;
use crate::card::{Card, Suit};
use crate::game::GamePhase;
use crate::player::{Seat, Team};
use crate::trick::CompletedTrick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub seat: Seat,
    pub hand: Vec<Card>,
    /// Cards held by each seat
    pub hand_sizes: Vec<usize>,
    pub phase: GamePhase,
    pub current_player: Seat,
    pub dealer: Seat,
    pub current_bid: Option<Bid>,
    pub passed: Vec<Seat>,
    pub trump: Option<Suit>,
    pub contractor: Option<Team>,
    pub current_trick: Vec<(Seat, Card)>,
    pub last_trick: Option<CompletedTrick>,
    pub round: u32,
    pub team_scores: [i32; 2],
    pub round_points: [u32; 2],
    pub kitty_size: usize,
}
