//! Dealing and the kitty exchange.
//!
//! With the 40-card deck and the kitty enabled, cards are dealt 3-2-3-2-3:
//! three to each player, two to the kitty, three each, two to the kitty,
//! three each. The bid winner may then pick up the kitty and bury four cards.
//! Buried cards never return to play; their points go to the defenders.

use crate::card::{hand_points, Card, Deck};
use crate::game::GameError;
use crate::player::{seats_from, Seat, SEATS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cards in a full kitty, and cards the bid winner must bury
pub const KITTY_SIZE: usize = 4;

/// Cards dealt to each player per packet
const PACKET: usize = 3;

/// Cards dealt to the kitty between packets
const KITTY_PACKET: usize = 2;

/// Result of dealing one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    /// Hands indexed by seat
    pub hands: [Vec<Card>; 4],
    pub kitty: Vec<Card>,
}

/// Deal the whole deck starting with `first`, going round the table.
///
/// With `with_kitty` the 3-2-3-2-3 pattern is used, otherwise players
/// receive packets of three until the deck is shared out evenly.
pub fn deal(mut deck: Deck, first: Seat, with_kitty: bool) -> Deal {
    let mut hands: [Vec<Card>; 4] = Default::default();
    let mut kitty = Vec::new();

    if with_kitty {
        for _ in 0..2 {
            for seat in seats_from(first) {
                hands[seat as usize].extend(deck.deal(PACKET));
            }
            kitty.extend(deck.deal(KITTY_PACKET));
        }
        for seat in seats_from(first) {
            hands[seat as usize].extend(deck.deal(PACKET));
        }
    } else {
        let hand_size = deck.len() / SEATS as usize;
        let mut dealt = 0;
        while dealt < hand_size {
            let packet = PACKET.min(hand_size - dealt);
            for seat in seats_from(first) {
                hands[seat as usize].extend(deck.deal(packet));
            }
            dealt += packet;
        }
    }

    Deal { hands, kitty }
}

/// Per-round kitty state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KittyState {
    /// Face-down cards still in the kitty
    pub cards: Vec<Card>,
    /// Cards buried by the bid winner
    pub discards: Vec<Card>,
    /// The bid winner picked up the kitty
    pub taken: bool,
    /// Exchange finished this round; it cannot be entered again
    pub completed: bool,
}

impl KittyState {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    /// Whether the exchange should run once bidding ends
    pub fn is_available(&self) -> bool {
        !self.cards.is_empty() && !self.completed
    }

    /// Hand the kitty over to the bid winner
    pub fn take(&mut self) -> Result<Vec<Card>, GameError> {
        if self.taken {
            return Err(GameError::KittyAlreadyTaken);
        }
        self.taken = true;
        Ok(std::mem::take(&mut self.cards))
    }

    /// Points buried in the kitty, credited to the defenders
    pub fn discard_points(&self) -> u32 {
        hand_points(&self.discards)
    }
}

/// Check that `cards` names exactly four distinct cards from `hand`
pub fn validate_discard(hand: &[Card], cards: &[Card]) -> Result<(), GameError> {
    if cards.len() != KITTY_SIZE {
        return Err(GameError::InvalidDiscard(format!(
            "expected {KITTY_SIZE} cards, got {}",
            cards.len()
        )));
    }
    let unique: HashSet<&Card> = cards.iter().collect();
    if unique.len() != cards.len() {
        return Err(GameError::InvalidDiscard("duplicate card".into()));
    }
    if let Some(missing) = cards.iter().find(|c| !hand.contains(c)) {
        return Err(GameError::InvalidDiscard(format!("{missing} is not in hand")));
    }
    Ok(())
}
