//! Trick resolution.
//!
//! Follow-suit legality, trick winner determination and point tallying.

use crate::card::{hand_points, Card, Suit};
use crate::player::Seat;
use serde::{Deserialize, Serialize};

/// Cards in a complete trick
pub const TRICK_SIZE: usize = 4;

/// Whether `challenger` takes the trick away from `current`.
///
/// A trump beats any non-trump and a lower trump. A lead-suit card beats a
/// lower lead-suit card. Anything else never wins.
pub fn beats(challenger: Card, current: Card, lead: Suit, trump: Option<Suit>) -> bool {
    let is_trump = |card: Card| Some(card.suit) == trump;

    if is_trump(challenger) {
        return !is_trump(current) || challenger.rank > current.rank;
    }
    challenger.suit == lead && current.suit == lead && challenger.rank > current.rank
}

/// Cards in `hand` that may be played to `trick`.
///
/// Holding any card of the lead suit restricts play to that suit; otherwise
/// the whole hand is legal.
pub fn legal_plays(hand: &[Card], trick: &Trick) -> Vec<Card> {
    if let Some(lead) = trick.lead_suit() {
        let following: Vec<Card> = hand.iter().copied().filter(|c| c.suit == lead).collect();
        if !following.is_empty() {
            return following;
        }
    }
    hand.to_vec()
}

/// The trick in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    /// Plays in order
    pub plays: Vec<(Seat, Card)>,
}

impl Trick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() >= TRICK_SIZE
    }

    /// Suit of the first card, undefined for an empty trick
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|(_, card)| card.suit)
    }

    pub fn push(&mut self, seat: Seat, card: Card) {
        self.plays.push((seat, card));
    }

    pub fn cards(&self) -> Vec<Card> {
        self.plays.iter().map(|(_, card)| *card).collect()
    }

    pub fn points(&self) -> u32 {
        hand_points(&self.cards())
    }

    /// The play currently holding the trick
    pub fn winning_play(&self, trump: Option<Suit>) -> Option<(Seat, Card)> {
        let lead = self.lead_suit()?;
        let mut best = self.plays[0];
        for &(seat, card) in &self.plays[1..] {
            if beats(card, best.1, lead, trump) {
                best = (seat, card);
            }
        }
        Some(best)
    }

    /// Whether playing `card` now would take the lead in the trick
    pub fn would_win(&self, card: Card, trump: Option<Suit>) -> bool {
        match (self.lead_suit(), self.winning_play(trump)) {
            (Some(lead), Some((_, best))) => beats(card, best, lead, trump),
            _ => true,
        }
    }

    /// Close out a full trick
    pub fn complete(self, trump: Option<Suit>) -> Option<CompletedTrick> {
        if !self.is_complete() {
            return None;
        }
        let (winner, _) = self.winning_play(trump)?;
        let points = self.points();
        Some(CompletedTrick {
            plays: self.plays,
            winner,
            points,
        })
    }
}

/// A resolved trick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTrick {
    pub plays: Vec<(Seat, Card)>,
    pub winner: Seat,
    pub points: u32,
}
