//! Card-location beliefs for the expert bot.
//!
//! A `Belief` is one seat's picture of the round: the cards it has seen
//! (its own hand and everything played) and, for every card it has not
//! seen, the probability that each other seat holds it. Mass is spread
//! uniformly over the seats that could still hold the card; a seat that
//! failed to follow suit drops out for that suit.
//!
//! Updates are pure: [`Belief::observe`] returns a new belief and leaves
//! the previous one untouched.

use crate::card::{Card, Deck, DeckVariant, Rank, Suit};
use crate::player::{Seat, SEATS};
use std::collections::{BTreeMap, BTreeSet};

/// One card seen leaving a hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub seat: Seat,
    pub card: Card,
    /// Lead suit of the trick the card went to; `None` if it was the lead
    pub led: Option<Suit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Belief {
    owner: Seat,
    seen: BTreeSet<Card>,
    /// Probability by seat for every unseen card
    table: BTreeMap<Card, [f32; 4]>,
    /// `voids[seat]` holds the suits that seat has shown out of
    voids: [BTreeSet<Suit>; 4],
}

impl Belief {
    /// Fresh belief for `owner`, who knows the cards in `known`
    pub fn new(owner: Seat, variant: DeckVariant, known: &[Card]) -> Self {
        let seen: BTreeSet<Card> = known.iter().copied().collect();
        let table = Deck::new(variant)
            .cards()
            .iter()
            .filter(|c| !seen.contains(c))
            .map(|c| (*c, [0.0; 4]))
            .collect();

        let mut belief = Self {
            owner,
            seen,
            table,
            voids: Default::default(),
        };
        belief.redistribute();
        belief
    }

    /// Belief after seeing `obs`
    pub fn observe(&self, obs: Observation) -> Self {
        let mut next = self.clone();
        next.seen.insert(obs.card);
        next.table.remove(&obs.card);

        if let Some(led) = obs.led {
            if obs.card.suit != led && obs.seat != next.owner {
                next.voids[obs.seat as usize].insert(led);
            }
        }
        next.redistribute();
        next
    }

    /// Spread each unseen card evenly over the seats that may hold it
    fn redistribute(&mut self) {
        let owner = self.owner;
        let voids = &self.voids;
        for (card, row) in self.table.iter_mut() {
            let candidates: Vec<Seat> = (0..SEATS)
                .filter(|s| *s != owner && !voids[*s as usize].contains(&card.suit))
                .collect();
            // Everyone has shown out: the card must be buried, spread it anyway
            let candidates = if candidates.is_empty() {
                (0..SEATS).filter(|s| *s != owner).collect()
            } else {
                candidates
            };

            let share = 1.0 / candidates.len() as f32;
            *row = [0.0; 4];
            for seat in candidates {
                row[seat as usize] = share;
            }
        }
    }

    pub fn owner(&self) -> Seat {
        self.owner
    }

    pub fn is_seen(&self, card: Card) -> bool {
        self.seen.contains(&card)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Probability that `seat` holds `card`. Zero once the card is seen.
    pub fn probability(&self, card: Card, seat: Seat) -> f32 {
        self.table
            .get(&card)
            .map(|row| row[seat as usize % 4])
            .unwrap_or(0.0)
    }

    pub fn unseen(&self) -> impl Iterator<Item = Card> + '_ {
        self.table.keys().copied()
    }

    pub fn is_void(&self, seat: Seat, suit: Suit) -> bool {
        self.voids[seat as usize % 4].contains(&suit)
    }

    /// Unseen cards of `suit` ranking above `rank`
    pub fn unseen_above(&self, suit: Suit, rank: Rank) -> impl Iterator<Item = Card> + '_ {
        self.unseen().filter(move |c| c.suit == suit && c.rank > rank)
    }

    /// No unseen card of the same suit outranks `card`
    pub fn is_master(&self, card: Card) -> bool {
        self.unseen_above(card.suit, card.rank).next().is_none()
    }

    /// Chance that at least one of `seats` holds a higher card of `card`'s suit
    pub fn chance_higher_held(&self, card: Card, seats: &[Seat]) -> f32 {
        let none_held: f32 = self
            .unseen_above(card.suit, card.rank)
            .map(|c| {
                let p: f32 = seats.iter().map(|s| self.probability(c, *s)).sum();
                1.0 - p.min(1.0)
            })
            .product();
        1.0 - none_held
    }
}
