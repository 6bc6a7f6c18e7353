//! Card and deck primitives.
//!
//! This module contains:
//! - Suits and ranks, with the rank order used for trick resolution
//! - Card point values (aces and tens 10, fives and sixes 5)
//! - Deck construction and shuffling for the 36- and 40-card variants

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four card suits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub fn symbol(&self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }
}

/// Card ranks, declared in ascending trick-taking order.
///
/// `Six` only exists in the 40-card deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ORDERED: [Rank; 10] = [
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Card points carried by this rank
    pub fn points(self) -> u32 {
        match self {
            Rank::Ace | Rank::Ten => 10,
            Rank::Five | Rank::Six => 5,
            _ => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// A single playing card.
///
/// Suit and rank together are the card's identity; no two cards in a deck
/// share both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    pub fn points(&self) -> u32 {
        self.rank.points()
    }

    /// Stable identifier used by clients, e.g. `"10-hearts"`
    pub fn id(&self) -> String {
        format!("{}-{:?}", self.rank.label(), self.suit).to_lowercase()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// Sum of point values over a set of cards
pub fn hand_points(cards: &[Card]) -> u32 {
    cards.iter().map(Card::points).sum()
}

/// Which card pool is in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckVariant {
    /// 36 cards: 5, 7 through A
    Short36,
    /// 40 cards: adds the four sixes, allows the kitty
    Full40,
}

impl DeckVariant {
    pub fn size(&self) -> usize {
        match self {
            DeckVariant::Short36 => 36,
            DeckVariant::Full40 => 40,
        }
    }

    /// Ranks present in this variant, ascending
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        Rank::ORDERED
            .into_iter()
            .filter(move |r| *r != Rank::Six || matches!(self, DeckVariant::Full40))
    }

    /// Total card points available in the variant
    pub fn total_points(&self) -> u32 {
        self.ranks().map(Rank::points).sum::<u32>() * 4
    }
}

/// An ordered pile of cards, dealt from the top
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Create an unshuffled deck of the given variant
    pub fn new(variant: DeckVariant) -> Self {
        let mut cards = Vec::with_capacity(variant.size());
        for suit in Suit::ALL {
            for rank in variant.ranks() {
                cards.push(Card::new(suit, rank));
            }
        }
        Self { cards }
    }

    /// Create a shuffled deck
    pub fn shuffled<R: Rng>(variant: DeckVariant, rng: &mut R) -> Self {
        let mut deck = Self::new(variant);
        deck.cards.shuffle(rng);
        deck
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Take up to `count` cards off the top
    pub fn deal(&mut self, count: usize) -> Vec<Card> {
        let count = count.min(self.cards.len());
        self.cards.drain(..count).collect()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
