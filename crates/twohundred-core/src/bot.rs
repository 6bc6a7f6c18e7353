//! AI Bot players for 200.
//!
//! This module provides different skill levels of AI players:
//! - Easy / Medium / Hard: hand-value bidding with a skill offset, and
//!   "cheapest card that beats the trick" play. Hard also trumps in to
//!   capture high-point tricks.
//! - Expert: tracks a per-round [`Belief`] about unseen cards, weighs the
//!   score situation when bidding, and picks a per-trick play strategy.
//!
//! Bots only ever produce a [`GameAction`]; it goes through the same
//! `GameState::apply_action` entry point as a human's.

use crate::actions::GameAction;
use crate::belief::{Belief, Observation};
use crate::bidding::{Bid, BID_STEP, MAX_BID, MIN_BID};
use crate::card::{hand_points, Card, Rank, Suit};
use crate::game::{GameError, GamePhase, GameState};
use crate::kitty::KITTY_SIZE;
use crate::player::{next_seat, Seat, Team};
use crate::trick::{Trick, TRICK_SIZE};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// A trick worth at least this many points is worth fighting for
const HIGH_POINT_TRICK: u32 = 10;

/// Holding this many trumps or fewer counts as running low
const LOW_TRUMP_SUPPLY: usize = 2;

/// Points the expert assumes its partner will contribute
const PARTNER_ALLOWANCE: i32 = 15;

/// Bot skill level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotSkill {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl BotSkill {
    /// Added to hand points to get the heuristic bidding ceiling
    fn bid_offset(self) -> i32 {
        match self {
            BotSkill::Easy => 30,
            BotSkill::Medium => 25,
            BotSkill::Hard => 20,
            BotSkill::Expert => PARTNER_ALLOWANCE,
        }
    }
}

/// What a bot wants to do during the auction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    Bid { points: u32, suit: Suit },
    Pass,
}

impl BidDecision {
    pub fn into_action(self) -> GameAction {
        match self {
            BidDecision::Bid { points, suit } => GameAction::Bid {
                points,
                suit: Some(suit),
            },
            BidDecision::Pass => GameAction::Pass,
        }
    }
}

/// Per-trick plan used by the expert bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStrategy {
    /// Cheapest card that takes the trick
    WinTrick,
    /// Cheapest card that does not take the trick
    LoseTrick,
    /// Keep trumps back unless there is no other legal card
    ConserveTrump,
    /// Reserved; plays as `Default`
    SignalPartner,
    /// Mid-value lead, otherwise the standard follow rule
    Default,
}

/// A bot's decision policy, fixed when the bot is created
pub trait Strategy: Send {
    fn decide_bid(&mut self, game: &GameState, seat: Seat) -> BidDecision;

    fn decide_play(&mut self, game: &GameState, seat: Seat) -> Result<Card, GameError>;

    /// Cards to bury and trump to name after picking up the kitty
    fn decide_discard(&mut self, game: &GameState, seat: Seat) -> (Vec<Card>, Suit) {
        default_discard(game, seat)
    }
}

/// A bot player that can decide on actions
pub struct Bot {
    pub seat: Seat,
    pub skill: BotSkill,
    strategy: Box<dyn Strategy>,
}

impl Bot {
    pub fn new(seat: Seat, skill: BotSkill) -> Self {
        Self::with_rng(seat, skill, StdRng::from_entropy())
    }

    pub fn with_seed(seat: Seat, skill: BotSkill, seed: u64) -> Self {
        Self::with_rng(seat, skill, StdRng::seed_from_u64(seed))
    }

    fn with_rng(seat: Seat, skill: BotSkill, rng: StdRng) -> Self {
        let strategy: Box<dyn Strategy> = match skill {
            BotSkill::Expert => Box::new(ExpertStrategy::new(rng)),
            _ => Box::new(HeuristicStrategy::new(skill, rng)),
        };
        Self {
            seat,
            skill,
            strategy,
        }
    }

    /// Choose the next action, or `None` if this bot is not the one to act
    pub fn choose_action(&mut self, game: &GameState) -> Result<Option<GameAction>, GameError> {
        if game.current_player != self.seat {
            return Ok(None);
        }

        let action = match game.phase {
            GamePhase::Bidding => {
                if game.bidding.has_passed(self.seat) {
                    return Ok(None);
                }
                self.strategy.decide_bid(game, self.seat).into_action()
            }
            GamePhase::Kitty { taken: false } => GameAction::TakeKitty,
            GamePhase::Kitty { taken: true } => {
                let (cards, trump) = self.strategy.decide_discard(game, self.seat);
                GameAction::DiscardToKitty { cards, trump }
            }
            GamePhase::Playing => GameAction::PlayCard(self.strategy.decide_play(game, self.seat)?),
            GamePhase::Waiting | GamePhase::Finished { .. } => return Ok(None),
        };

        Ok(Some(action))
    }
}

// ==================== Shared helpers ====================

/// Round to the nearest bid step and clamp into the legal bid range
pub fn bid_ceiling(estimate: i32) -> u32 {
    let step = BID_STEP as i32;
    let rounded = (estimate + step / 2).div_euclid(step) * step;
    rounded.clamp(MIN_BID as i32, MAX_BID as i32) as u32
}

/// Longest suit in hand, ties broken by points then by high cards
pub fn strongest_suit(hand: &[Card]) -> Suit {
    Suit::ALL
        .into_iter()
        .max_by_key(|suit| {
            let cards: Vec<Card> = hand.iter().copied().filter(|c| c.suit == *suit).collect();
            let top = cards.iter().map(|c| c.rank).max();
            (cards.len(), hand_points(&cards), top)
        })
        .unwrap_or(Suit::Hearts)
}

fn is_trump(card: Card, trump: Option<Suit>) -> bool {
    Some(card.suit) == trump
}

fn no_legal_card(seat: Seat) -> GameError {
    GameError::InvariantViolation(format!("seat {seat} has cards but no legal play"))
}

/// Least valuable card: non-trump before trump, then fewest points, then lowest rank
fn cheapest(cards: &[Card], trump: Option<Suit>) -> Option<Card> {
    cards
        .iter()
        .copied()
        .min_by_key(|c| (c.points(), is_trump(*c, trump), c.rank))
}

fn cheapest_winner(trick: &Trick, legal: &[Card], trump: Option<Suit>) -> Option<Card> {
    legal
        .iter()
        .copied()
        .filter(|c| trick.would_win(*c, trump))
        .min_by_key(|c| (is_trump(*c, trump), c.points(), c.rank))
}

fn cheapest_loser(trick: &Trick, legal: &[Card], trump: Option<Suit>) -> Option<Card> {
    let losers: Vec<Card> = legal
        .iter()
        .copied()
        .filter(|c| !trick.would_win(*c, trump))
        .collect();
    cheapest(&losers, trump)
}

/// Standard follow rule: when holding the lead suit, the lowest card that
/// beats the trick (or the lowest one if none does); when void, dump the
/// cheapest card.
fn follow_play(game: &GameState, seat: Seat, legal: &[Card]) -> Option<Card> {
    let trick = &game.current_trick;
    let trump = game.trump;
    let lead = trick.lead_suit()?;
    let holds_lead = game.get_player(seat)?.has_suit(lead);

    if holds_lead {
        let winners: Vec<Card> = legal
            .iter()
            .copied()
            .filter(|c| trick.would_win(*c, trump))
            .collect();
        let pool = if winners.is_empty() { legal } else { &winners[..] };
        return pool.iter().copied().min_by_key(|c| c.rank);
    }

    cheapest(legal, trump)
}

/// Keep the bid suit unless the kitty made another suit longer, then bury
/// the four cheapest non-trump cards.
pub fn default_discard(game: &GameState, seat: Seat) -> (Vec<Card>, Suit) {
    let hand = game
        .get_player(seat)
        .map(|p| p.hand.clone())
        .unwrap_or_default();

    let best = strongest_suit(&hand);
    let trump = match game.current_bid() {
        Some(bid) if count_suit(&hand, bid.suit) >= count_suit(&hand, best) => bid.suit,
        _ => best,
    };

    let mut candidates = hand;
    candidates.sort_by_key(|c| (c.suit == trump, c.points(), c.rank));
    candidates.truncate(KITTY_SIZE);
    (candidates, trump)
}

fn count_suit(hand: &[Card], suit: Suit) -> usize {
    hand.iter().filter(|c| c.suit == suit).count()
}

// ==================== Easy / Medium / Hard ====================

/// Hand-value bidding and greedy play, tuned by skill
pub struct HeuristicStrategy {
    skill: BotSkill,
    rng: StdRng,
}

impl HeuristicStrategy {
    pub fn new(skill: BotSkill, rng: StdRng) -> Self {
        Self { skill, rng }
    }

    fn lead_card(&mut self, legal: &[Card], trump: Option<Suit>) -> Option<Card> {
        let plain: Vec<Card> = legal
            .iter()
            .copied()
            .filter(|c| !is_trump(*c, trump))
            .collect();
        let pool = if plain.is_empty() { legal } else { &plain[..] };

        match self.skill {
            BotSkill::Easy => legal.choose(&mut self.rng).copied(),
            BotSkill::Hard => pool
                .iter()
                .copied()
                .find(|c| c.rank == Rank::Ace)
                .or_else(|| pool.iter().copied().min_by_key(|c| (c.points(), c.rank))),
            _ => pool.iter().copied().min_by_key(|c| (c.points(), c.rank)),
        }
    }
}

impl Strategy for HeuristicStrategy {
    fn decide_bid(&mut self, game: &GameState, seat: Seat) -> BidDecision {
        let Some(player) = game.get_player(seat) else {
            return BidDecision::Pass;
        };

        // Never outbid a partner
        if let Some(current) = game.current_bid() {
            if current.team() == Team::of(seat) {
                return BidDecision::Pass;
            }
        }

        let ceiling = bid_ceiling(hand_points(&player.hand) as i32 + self.skill.bid_offset());
        match game.bidding.min_next_bid() {
            Some(next) if next <= ceiling => BidDecision::Bid {
                points: next,
                suit: strongest_suit(&player.hand),
            },
            _ => BidDecision::Pass,
        }
    }

    fn decide_play(&mut self, game: &GameState, seat: Seat) -> Result<Card, GameError> {
        let legal = game.legal_plays(seat);
        let trump = game.trump;
        let trick = &game.current_trick;

        if trick.is_empty() {
            return self.lead_card(&legal, trump).ok_or_else(|| no_legal_card(seat));
        }

        let void_in_lead = trick
            .lead_suit()
            .map_or(false, |lead| !legal.iter().any(|c| c.suit == lead));

        if self.skill == BotSkill::Hard && void_in_lead && trick.points() >= HIGH_POINT_TRICK {
            let trumps: Vec<Card> = legal.iter().copied().filter(|c| is_trump(*c, trump)).collect();
            if let Some(card) = cheapest_winner(trick, &trumps, trump) {
                return Ok(card);
            }
        }

        follow_play(game, seat, &legal).ok_or_else(|| no_legal_card(seat))
    }
}

// ==================== Expert ====================

/// Belief cached for one round, advanced as cards are played
struct TrackedBelief {
    round: u32,
    observed: usize,
    belief: Belief,
}

/// Belief-tracking bot with score-aware bidding
pub struct ExpertStrategy {
    rng: StdRng,
    tracked: Option<TrackedBelief>,
}

impl ExpertStrategy {
    pub fn new(rng: StdRng) -> Self {
        Self { rng, tracked: None }
    }

    /// Bring the cached belief up to date with the cards played so far
    fn sync_belief(&mut self, game: &GameState, seat: Seat) -> &Belief {
        let stale = self.tracked.as_ref().map_or(true, |t| {
            t.round != game.round || t.observed > game.played_this_round.len()
        });
        if stale {
            self.tracked = None;
        }

        let tracked = self.tracked.get_or_insert_with(|| {
            let mut known = game
                .get_player(seat)
                .map(|p| p.hand.clone())
                .unwrap_or_default();
            if game.kitty.completed && game.current_bid().map(|b| b.seat) == Some(seat) {
                known.extend(game.kitty.discards.iter().copied());
            }
            TrackedBelief {
                round: game.round,
                observed: 0,
                belief: Belief::new(seat, game.config.deck_variant, &known),
            }
        });

        let plays = &game.played_this_round;
        for (idx, &(who, card)) in plays.iter().enumerate().skip(tracked.observed) {
            let offset = idx % TRICK_SIZE;
            let led = (offset != 0).then(|| plays[idx - offset].1.suit);
            tracked.belief = tracked.belief.observe(Observation {
                seat: who,
                card,
                led,
            });
        }
        tracked.observed = plays.len();
        &tracked.belief
    }

    /// Expert's bidding estimate for `seat`'s hand in the current situation
    pub fn estimate(game: &GameState, seat: Seat) -> i32 {
        let Some(player) = game.get_player(seat) else {
            return 0;
        };
        let hand = &player.hand;
        let suit = strongest_suit(hand);
        let trump_density = count_suit(hand, suit) as i32;
        let aces = hand.iter().filter(|c| c.rank == Rank::Ace).count() as i32;

        let mut estimate =
            hand_points(hand) as i32 + trump_density * 4 + aces * 3 + PARTNER_ALLOWANCE;

        let team = Team::of(seat);
        let ours = game.team_scores[team.index()];
        let theirs = game.team_scores[team.other().index()];
        let target = game.config.score_target;

        // Press when behind, hold back when the game is nearly decided
        if theirs - ours >= 50 {
            estimate += 10;
        }
        if ours.max(theirs) >= target * 3 / 4 {
            estimate -= 5;
        }
        if ours <= -target / 2 {
            estimate -= 10;
        }
        estimate
    }

    /// Pick the plan for this trick
    pub fn choose_strategy(
        game: &GameState,
        seat: Seat,
        legal: &[Card],
        belief: &Belief,
    ) -> PlayStrategy {
        let team = Team::of(seat);
        let trump = game.trump;
        let trick = &game.current_trick;
        let short_of_bid = game.contractor == Some(team)
            && game
                .current_bid()
                .map_or(false, |b| game.round_points[team.index()] < b.points);

        let Some(lead) = trick.lead_suit() else {
            let has_master = legal
                .iter()
                .any(|c| !is_trump(*c, trump) && belief.is_master(*c));
            return if short_of_bid && has_master {
                PlayStrategy::WinTrick
            } else {
                PlayStrategy::Default
            };
        };

        let last_to_act = trick.len() == TRICK_SIZE - 1;
        let cheap = cheapest_winner(trick, legal, trump);
        let winning = trick.winning_play(trump);

        if let Some((holder, best)) = winning {
            if Team::of(holder) == team {
                let still_to_play = opponents_yet_to_play(seat, trick);
                let partner_safe = last_to_act
                    || (!is_trump(best, trump)
                        && belief.chance_higher_held(best, &still_to_play) < 0.3
                        && still_to_play.iter().all(|s| !belief.is_void(*s, lead)));
                if partner_safe {
                    return PlayStrategy::LoseTrick;
                }
            }
        }

        if short_of_bid {
            return if cheap.is_some() {
                PlayStrategy::WinTrick
            } else {
                PlayStrategy::LoseTrick
            };
        }

        if last_to_act {
            let costly = cheap.map_or(true, |c| is_trump(c, trump) && trick.points() == 0);
            return if costly {
                PlayStrategy::LoseTrick
            } else {
                PlayStrategy::WinTrick
            };
        }

        let void_in_lead = !legal.iter().any(|c| c.suit == lead);
        if let (true, Some(trump_suit)) = (void_in_lead, trump) {
            let trumps_held = game.get_player(seat).map_or(0, |p| p.count_suit(trump_suit));
            if trumps_held <= LOW_TRUMP_SUPPLY && trick.points() < HIGH_POINT_TRICK {
                return PlayStrategy::ConserveTrump;
            }
        }

        if trick.points() >= HIGH_POINT_TRICK && cheap.is_some() {
            return PlayStrategy::WinTrick;
        }

        PlayStrategy::Default
    }

    fn play_strategy(
        &mut self,
        strategy: PlayStrategy,
        game: &GameState,
        seat: Seat,
        legal: &[Card],
        belief: &Belief,
    ) -> Option<Card> {
        let trump = game.trump;
        let trick = &game.current_trick;

        match strategy {
            PlayStrategy::WinTrick if trick.is_empty() => legal
                .iter()
                .copied()
                .filter(|c| !is_trump(*c, trump) && belief.is_master(*c))
                .max_by_key(|c| (c.points(), c.rank))
                .or_else(|| self.play_strategy(PlayStrategy::Default, game, seat, legal, belief)),
            PlayStrategy::WinTrick => cheapest_winner(trick, legal, trump)
                .or_else(|| cheapest(legal, trump)),
            PlayStrategy::LoseTrick => {
                cheapest_loser(trick, legal, trump).or_else(|| cheapest(legal, trump))
            }
            PlayStrategy::ConserveTrump => {
                let plain: Vec<Card> = legal
                    .iter()
                    .copied()
                    .filter(|c| !is_trump(*c, trump))
                    .collect();
                cheapest(&plain, trump).or_else(|| cheapest(legal, trump))
            }
            PlayStrategy::SignalPartner | PlayStrategy::Default => {
                if trick.is_empty() {
                    medium_lead(legal, trump, &mut self.rng)
                } else {
                    follow_play(game, seat, legal)
                }
            }
        }
    }
}

/// Opponents of `seat` who still have to play to `trick` after `seat`
fn opponents_yet_to_play(seat: Seat, trick: &Trick) -> Vec<Seat> {
    let remaining = TRICK_SIZE - 1 - trick.len();
    let team = Team::of(seat);
    let mut seats = Vec::new();
    let mut next = seat;
    for _ in 0..remaining {
        next = next_seat(next);
        if Team::of(next) != team {
            seats.push(next);
        }
    }
    seats
}

/// A middling card to lead blind, preferring non-trumps
fn medium_lead(legal: &[Card], trump: Option<Suit>, rng: &mut StdRng) -> Option<Card> {
    let mut pool: Vec<Card> = legal
        .iter()
        .copied()
        .filter(|c| !is_trump(*c, trump) && c.points() == 0)
        .collect();
    if pool.is_empty() {
        pool = legal.to_vec();
    }
    // Shuffle first so equal ranks in different suits are picked fairly
    pool.shuffle(rng);
    pool.sort_by_key(|c| c.rank);
    pool.get(pool.len() / 2).copied()
}

impl Strategy for ExpertStrategy {
    fn decide_bid(&mut self, game: &GameState, seat: Seat) -> BidDecision {
        let Some(player) = game.get_player(seat) else {
            return BidDecision::Pass;
        };
        let mut estimate = Self::estimate(game, seat);

        if let Some(Bid { seat: holder, points, .. }) = game.current_bid() {
            if holder == seat {
                return BidDecision::Pass;
            }
            if Team::of(holder) == Team::of(seat) {
                // Partner holds the contract; take over only with a clear margin
                if estimate < points as i32 + 20 {
                    return BidDecision::Pass;
                }
            } else {
                estimate += 5;
            }
        }

        if estimate < MIN_BID as i32 {
            return BidDecision::Pass;
        }

        let ceiling = bid_ceiling(estimate);
        match game.bidding.min_next_bid() {
            Some(next) if next <= ceiling => BidDecision::Bid {
                points: next,
                suit: strongest_suit(&player.hand),
            },
            _ => BidDecision::Pass,
        }
    }

    fn decide_play(&mut self, game: &GameState, seat: Seat) -> Result<Card, GameError> {
        let legal = game.legal_plays(seat);
        if legal.is_empty() {
            return Err(no_legal_card(seat));
        }

        let belief = self.sync_belief(game, seat).clone();
        let strategy = Self::choose_strategy(game, seat, &legal, &belief);
        self.play_strategy(strategy, game, seat, &legal, &belief)
            .ok_or_else(|| no_legal_card(seat))
    }
}
