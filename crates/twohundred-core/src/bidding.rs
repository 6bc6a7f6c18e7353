//! Bidding engine.
//!
//! Tracks the current high bid and the set of players who have passed, and
//! decides after every action whether the auction is over.

use crate::card::Suit;
use crate::game::GameError;
use crate::player::{next_seat, Seat, Team, SEATS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lowest admissible bid
pub const MIN_BID: u32 = 50;

/// Highest admissible bid; reaching it closes the auction
pub const MAX_BID: u32 = 100;

/// Bids move in steps of this size
pub const BID_STEP: u32 = 5;

/// A bid for the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub seat: Seat,
    pub points: u32,
    /// Trump the bidder would name; required on every bid
    pub suit: Suit,
}

impl Bid {
    pub fn team(&self) -> Team {
        Team::of(self.seat)
    }
}

/// What happens after a bidding action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiddingOutcome {
    /// Auction continues with this seat to act
    Continue { next: Seat },
    /// Auction closed with this winning bid
    Won(Bid),
    /// Everyone passed; the hand is thrown in
    AllPassed,
}

/// Per-round auction state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiddingState {
    /// The bid to beat. Superseded bids are dropped.
    pub current: Option<Bid>,
    /// Seats that passed this round; a pass is final until the next deal
    pub passed: BTreeSet<Seat>,
    /// Whether each team placed at least one bid this round
    pub team_bid: [bool; 2],
}

impl BiddingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_passed(&self, seat: Seat) -> bool {
        self.passed.contains(&seat)
    }

    pub fn team_has_bid(&self, team: Team) -> bool {
        self.team_bid[team.index()]
    }

    /// Smallest bid that would currently be accepted, or `None` once the
    /// maximum has been reached
    pub fn min_next_bid(&self) -> Option<u32> {
        match self.current {
            None => Some(MIN_BID),
            Some(bid) if bid.points >= MAX_BID => None,
            Some(bid) => Some(bid.points + BID_STEP),
        }
    }

    /// Check a bid without applying it
    pub fn validate_bid(
        &self,
        seat: Seat,
        points: u32,
        suit: Option<Suit>,
    ) -> Result<Suit, GameError> {
        if self.has_passed(seat) {
            return Err(GameError::AlreadyPassed);
        }
        if points % BID_STEP != 0 {
            return Err(GameError::InvalidBid(format!(
                "{points} is not a multiple of {BID_STEP}"
            )));
        }
        if !(MIN_BID..=MAX_BID).contains(&points) {
            return Err(GameError::InvalidBid(format!(
                "{points} is outside {MIN_BID}-{MAX_BID}"
            )));
        }
        if let Some(current) = self.current {
            if points <= current.points {
                return Err(GameError::InvalidBid(format!(
                    "{points} does not beat {}",
                    current.points
                )));
            }
        }
        suit.ok_or_else(|| GameError::InvalidBid("a trump suit must accompany the bid".into()))
    }

    /// Record a bid by `seat`
    pub fn place_bid(
        &mut self,
        seat: Seat,
        points: u32,
        suit: Option<Suit>,
    ) -> Result<BiddingOutcome, GameError> {
        let suit = self.validate_bid(seat, points, suit)?;

        self.current = Some(Bid { seat, points, suit });
        self.passed.remove(&seat);
        self.team_bid[Team::of(seat).index()] = true;

        Ok(self.resolve(seat))
    }

    /// Record a pass by `seat`
    pub fn pass(&mut self, seat: Seat) -> Result<BiddingOutcome, GameError> {
        if self.has_passed(seat) {
            return Err(GameError::AlreadyPassed);
        }
        self.passed.insert(seat);
        Ok(self.resolve(seat))
    }

    /// Termination check after `actor` has acted
    fn resolve(&self, actor: Seat) -> BiddingOutcome {
        if let Some(bid) = self.current {
            if bid.points >= MAX_BID {
                return BiddingOutcome::Won(bid);
            }
        }

        if self.passed.len() >= SEATS as usize {
            return BiddingOutcome::AllPassed;
        }

        if let Some(bid) = self.current {
            // Only the high bidder is left standing
            if self.passed.len() >= SEATS as usize - 1 {
                return BiddingOutcome::Won(bid);
            }
        }

        match self.next_bidder(actor) {
            Some(next) => BiddingOutcome::Continue { next },
            None => BiddingOutcome::AllPassed,
        }
    }

    /// Next seat after `from` that has not passed
    pub fn next_bidder(&self, from: Seat) -> Option<Seat> {
        let mut seat = from;
        for _ in 0..SEATS {
            seat = next_seat(seat);
            if !self.has_passed(seat) {
                return Some(seat);
            }
        }
        None
    }
}
