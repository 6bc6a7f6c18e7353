//! Seating, teams, and the turn sequencer.
//!
//! This module contains:
//! - Seat positions 0-3 and the fixed clockwise rotation between them
//! - Team membership derived from seat parity
//! - Player struct holding a seat's hand for the current round

use crate::bot::BotSkill;
use crate::card::{Card, Suit};
use crate::config::SeatConfig;
use serde::{Deserialize, Serialize};

/// Seat position at the table (0-3)
pub type Seat = u8;

/// Number of seats at a table
pub const SEATS: u8 = 4;

/// The seat that acts after `seat`.
///
/// Bidding and trick play use the same rotation; there is no separate
/// bidding order.
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % SEATS
}

/// Seats in rotation order starting at `first`
pub fn seats_from(first: Seat) -> impl Iterator<Item = Seat> {
    (0..SEATS).map(move |offset| (first + offset) % SEATS)
}

/// Partnership. Seats 0 and 2 play for `Team::One`, seats 1 and 3 for `Team::Two`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn of(seat: Seat) -> Self {
        if seat % 2 == 0 {
            Team::One
        } else {
            Team::Two
        }
    }

    pub fn other(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// Index into per-team arrays
    pub fn index(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }

    pub fn seats(self) -> [Seat; 2] {
        match self {
            Team::One => [0, 2],
            Team::Two => [1, 3],
        }
    }
}

/// The partner sitting opposite `seat`
pub fn partner_of(seat: Seat) -> Seat {
    (seat + 2) % SEATS
}

/// A single seat's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Seat position (0-3)
    pub seat: Seat,
    /// Display name
    pub name: String,
    pub is_bot: bool,
    /// Bot tier, only set for bot seats
    pub skill: Option<BotSkill>,
    /// Cards held this round. Order carries no rules meaning.
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(seat: Seat, config: SeatConfig) -> Self {
        Self {
            seat,
            name: config.name,
            is_bot: config.is_bot,
            skill: config.skill,
            hand: Vec::new(),
        }
    }

    pub fn team(&self) -> Team {
        Team::of(self.seat)
    }

    pub fn has_card(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    pub fn has_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|c| c.suit == suit)
    }

    pub fn count_suit(&self, suit: Suit) -> usize {
        self.hand.iter().filter(|c| c.suit == suit).count()
    }

    /// Remove a card from the hand, returning it if it was held
    pub fn remove_card(&mut self, card: Card) -> Option<Card> {
        let pos = self.hand.iter().position(|c| *c == card)?;
        Some(self.hand.remove(pos))
    }
}
