//! Core game state machine.
//!
//! This module contains the main `GameState` struct and the phase
//! controller. Every action, whether it comes from a human or a bot, enters
//! through [`GameState::apply_action`]; the bidding engine, kitty exchange,
//! trick resolver and round scorer are only reached from here.

use crate::actions::{GameAction, GameEvent, RedealReason};
use crate::bidding::{Bid, BiddingOutcome, BiddingState, BID_STEP, MAX_BID};
use crate::card::{Card, Deck, Suit};
use crate::config::{validate_seats, ConfigError, GameConfig, SeatConfig};
use crate::kitty::{self, KittyState};
use crate::player::{next_seat, Player, Seat, Team, SEATS};
use crate::scoring::{game_winner, score_round, RoundScore, RoundTally};
use crate::trick::{legal_plays, CompletedTrick, Trick};
use crate::view::PlayerView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Seated but not yet dealt
    Waiting,

    /// Auction for the contract
    Bidding,

    /// Bid winner exchanging with the kitty
    Kitty {
        /// Whether the kitty has been picked up yet
        taken: bool,
    },

    /// Trick play
    Playing,

    /// Game is over
    Finished { winner: Team },
}

/// Broad classes of failure, used by callers to decide who hears about it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Rejected action; nothing changed
    InvalidAction,
    /// The engine's own bookkeeping is broken
    InvariantViolation,
    /// Unknown game or player
    NotFound,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Invalid bid: {0}")]
    InvalidBid(String),

    #[error("You already passed this round")]
    AlreadyPassed,

    #[error("The kitty has not been taken yet")]
    KittyNotTaken,

    #[error("The kitty was already taken")]
    KittyAlreadyTaken,

    #[error("Invalid discard: {0}")]
    InvalidDiscard(String),

    #[error("No cards left in hand")]
    EmptyHand,

    #[error("Don't have that card")]
    CardNotInHand,

    #[error("Must follow the lead suit")]
    MustFollowSuit,

    #[error("Game is over")]
    GameOver,

    #[error("No player at seat {0}")]
    UnknownSeat(Seat),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            GameError::UnknownSeat(_) => ErrorKind::NotFound,
            _ => ErrorKind::InvalidAction,
        }
    }
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Table rules, fixed for the whole game
    pub config: GameConfig,
    /// All four players, indexed by seat
    pub players: Vec<Player>,
    /// Current game phase
    pub phase: GamePhase,
    /// Seat expected to act next
    pub current_player: Seat,
    pub dealer: Seat,
    /// Auction state for this round
    pub bidding: BiddingState,
    /// Trump for this round, set once play begins
    pub trump: Option<Suit>,
    pub contractor: Option<Team>,
    pub current_trick: Trick,
    /// Most recently completed trick, kept for display
    pub last_trick: Option<CompletedTrick>,
    /// Round number (starts at 1)
    pub round: u32,
    /// Cumulative scores, indexed by team. May go negative.
    pub team_scores: [i32; 2],
    /// Card points taken this round, indexed by team
    pub round_points: [u32; 2],
    pub kitty: KittyState,
    /// Every card played this round, in order
    pub played_this_round: Vec<(Seat, Card)>,
    /// Scores of all finished rounds
    pub history: Vec<RoundScore>,
    /// Seed for deal shuffles (for deterministic replays)
    rng_seed: u64,
    /// Deals made so far; mixed into the seed so each deal differs
    deals: u64,
}

impl GameState {
    /// Create a new game for four seated players
    pub fn new(config: GameConfig, seats: Vec<SeatConfig>) -> Result<Self, ConfigError> {
        let seed = rand::thread_rng().gen();
        Self::with_seed(config, seats, seed)
    }

    /// Create a game whose deals are reproducible from `seed`
    pub fn with_seed(
        config: GameConfig,
        seats: Vec<SeatConfig>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_seats(&seats)?;

        let players: Vec<Player> = seats
            .into_iter()
            .enumerate()
            .map(|(i, seat)| Player::new(i as Seat, seat))
            .collect();

        // First dealer is random
        let dealer = StdRng::seed_from_u64(seed).gen_range(0..SEATS);

        Ok(Self {
            config,
            players,
            phase: GamePhase::Waiting,
            current_player: next_seat(dealer),
            dealer,
            bidding: BiddingState::new(),
            trump: None,
            contractor: None,
            current_trick: Trick::new(),
            last_trick: None,
            round: 0,
            team_scores: [0, 0],
            round_points: [0, 0],
            kitty: KittyState::default(),
            played_this_round: Vec::new(),
            history: Vec::new(),
            rng_seed: seed,
            deals: 0,
        })
    }

    /// Deal the first round and open bidding
    pub fn start(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(GameError::InvalidPhase);
        }
        self.round = 1;
        Ok(vec![self.deal_round(None)])
    }

    /// Get a player by seat
    pub fn get_player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat as usize)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    /// Get the winning team if the game is finished
    pub fn winner(&self) -> Option<Team> {
        match self.phase {
            GamePhase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn current_bid(&self) -> Option<Bid> {
        self.bidding.current
    }

    pub fn is_bot(&self, seat: Seat) -> bool {
        self.get_player(seat).map(|p| p.is_bot).unwrap_or(false)
    }

    /// Cards `seat` may legally play right now, ignoring whose turn it is
    pub fn legal_plays(&self, seat: Seat) -> Vec<Card> {
        if self.phase != GamePhase::Playing {
            return Vec::new();
        }
        match self.get_player(seat) {
            Some(p) => legal_plays(&p.hand, &self.current_trick),
            None => Vec::new(),
        }
    }

    /// Get all currently valid actions for a player.
    ///
    /// Discard choices during the kitty exchange are not enumerated.
    pub fn valid_actions(&self, seat: Seat) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if seat != self.current_player {
            return actions;
        }

        match self.phase {
            GamePhase::Waiting | GamePhase::Finished { .. } => {}

            GamePhase::Bidding => {
                if self.bidding.has_passed(seat) {
                    return actions;
                }
                actions.push(GameAction::Pass);
                if let Some(min) = self.bidding.min_next_bid() {
                    for points in (min..=MAX_BID).step_by(BID_STEP as usize) {
                        for suit in Suit::ALL {
                            actions.push(GameAction::Bid {
                                points,
                                suit: Some(suit),
                            });
                        }
                    }
                }
            }

            GamePhase::Kitty { taken: false } => actions.push(GameAction::TakeKitty),
            GamePhase::Kitty { taken: true } => {}

            GamePhase::Playing => {
                for card in self.legal_plays(seat) {
                    actions.push(GameAction::PlayCard(card));
                }
            }
        }

        actions
    }

    /// What `seat` is allowed to see
    pub fn view_for(&self, seat: Seat) -> Option<PlayerView> {
        let player = self.get_player(seat)?;
        Some(PlayerView {
            seat,
            hand: player.hand.clone(),
            hand_sizes: self.players.iter().map(|p| p.hand.len()).collect(),
            phase: self.phase,
            current_player: self.current_player,
            dealer: self.dealer,
            current_bid: self.bidding.current,
            passed: self.bidding.passed.iter().copied().collect(),
            trump: self.trump,
            contractor: self.contractor,
            current_trick: self.current_trick.plays.clone(),
            last_trick: self.last_trick.clone(),
            round: self.round,
            team_scores: self.team_scores,
            round_points: self.round_points,
            kitty_size: self.kitty.cards.len(),
        })
    }

    /// Apply an action to the game state.
    ///
    /// A rejected action leaves the state exactly as it was.
    pub fn apply_action(
        &mut self,
        seat: Seat,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if seat >= SEATS {
            return Err(GameError::UnknownSeat(seat));
        }

        let mut events = Vec::new();

        match action {
            GameAction::Bid { points: 0, .. } | GameAction::Pass => {
                self.require_turn(seat, GamePhase::Bidding)?;
                let outcome = self.bidding.pass(seat)?;
                events.push(GameEvent::Passed { seat });
                self.after_bidding(outcome, &mut events);
            }

            GameAction::Bid { points, suit } => {
                self.require_turn(seat, GamePhase::Bidding)?;
                let outcome = self.bidding.place_bid(seat, points, suit)?;
                if let Some(bid) = self.bidding.current {
                    events.push(GameEvent::BidMade {
                        seat,
                        points: bid.points,
                        suit: bid.suit,
                    });
                }
                self.after_bidding(outcome, &mut events);
            }

            GameAction::TakeKitty => self.take_kitty(seat, &mut events)?,

            GameAction::DiscardToKitty { cards, trump } => {
                self.discard_to_kitty(seat, cards, trump, &mut events)?
            }

            GameAction::PlayCard(card) => self.play_card(seat, card, &mut events)?,
        }

        self.check_conservation()?;
        Ok(events)
    }

    fn require_turn(&self, seat: Seat, phase: GamePhase) -> Result<(), GameError> {
        if self.phase != phase {
            return Err(GameError::InvalidPhase);
        }
        if seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn after_bidding(&mut self, outcome: BiddingOutcome, events: &mut Vec<GameEvent>) {
        match outcome {
            BiddingOutcome::Continue { next } => self.current_player = next,

            BiddingOutcome::Won(bid) => {
                let contractor = bid.team();
                self.contractor = Some(contractor);
                self.current_player = bid.seat;
                events.push(GameEvent::BiddingWon { bid, contractor });

                if self.config.kitty_enabled() && self.kitty.is_available() {
                    self.phase = GamePhase::Kitty { taken: false };
                } else {
                    self.begin_play(bid.suit, events);
                }
            }

            BiddingOutcome::AllPassed => {
                self.dealer = next_seat(self.dealer);
                self.round += 1;
                events.push(self.deal_round(Some(RedealReason::AllPassed)));
            }
        }
    }

    fn begin_play(&mut self, trump: Suit, events: &mut Vec<GameEvent>) {
        self.trump = Some(trump);
        self.phase = GamePhase::Playing;
        events.push(GameEvent::PlayStarted {
            leader: self.current_player,
            trump,
        });
    }

    fn take_kitty(&mut self, seat: Seat, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if !matches!(self.phase, GamePhase::Kitty { .. }) {
            return Err(GameError::InvalidPhase);
        }
        if seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        if self.phase == (GamePhase::Kitty { taken: true }) {
            return Err(GameError::KittyAlreadyTaken);
        }

        let cards = self.kitty.take()?;
        let count = cards.len();
        self.players[seat as usize].hand.extend(cards);
        self.phase = GamePhase::Kitty { taken: true };

        events.push(GameEvent::KittyTaken { seat, cards: count });
        Ok(())
    }

    fn discard_to_kitty(
        &mut self,
        seat: Seat,
        cards: Vec<Card>,
        trump: Suit,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if !matches!(self.phase, GamePhase::Kitty { .. }) {
            return Err(GameError::InvalidPhase);
        }
        if seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        if self.phase == (GamePhase::Kitty { taken: false }) {
            return Err(GameError::KittyNotTaken);
        }
        kitty::validate_discard(&self.players[seat as usize].hand, &cards)?;

        let player = &mut self.players[seat as usize];
        for card in &cards {
            player.remove_card(*card);
        }
        self.kitty.discards = cards;
        self.kitty.completed = true;
        self.contractor = Some(Team::of(seat));

        events.push(GameEvent::KittyDiscarded { seat, trump });
        self.begin_play(trump, events);
        Ok(())
    }

    fn play_card(
        &mut self,
        seat: Seat,
        card: Card,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.require_turn(seat, GamePhase::Playing)?;

        let player = &self.players[seat as usize];
        if player.hand.is_empty() {
            return Err(GameError::EmptyHand);
        }
        if !player.has_card(card) {
            return Err(GameError::CardNotInHand);
        }
        if !legal_plays(&player.hand, &self.current_trick).contains(&card) {
            return Err(GameError::MustFollowSuit);
        }

        self.players[seat as usize].remove_card(card);
        self.current_trick.push(seat, card);
        self.played_this_round.push((seat, card));
        self.current_player = next_seat(seat);
        events.push(GameEvent::CardPlayed { seat, card });

        if self.current_trick.is_complete() {
            self.finish_trick(events)?;
        }
        Ok(())
    }

    fn finish_trick(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let trick = std::mem::take(&mut self.current_trick);
        let completed = trick
            .complete(self.trump)
            .ok_or_else(|| GameError::InvariantViolation("full trick did not resolve".into()))?;

        let team = Team::of(completed.winner);
        self.round_points[team.index()] += completed.points;
        self.current_player = completed.winner;
        self.last_trick = Some(completed.clone());

        events.push(GameEvent::TrickCompleted {
            trick: completed,
            team,
            round_points: self.round_points,
        });

        if self.players.iter().all(|p| p.hand.is_empty()) {
            self.finish_round(events)?;
        }
        Ok(())
    }

    fn finish_round(&mut self, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let bid = self
            .bidding
            .current
            .ok_or_else(|| GameError::InvariantViolation("round ended without a contract".into()))?;
        let contractor = self.contractor.unwrap_or_else(|| bid.team());

        let score = score_round(&RoundTally {
            bid,
            contractor,
            round_points: self.round_points,
            kitty_points: self.kitty.discard_points(),
            scores_before: self.team_scores,
            defenders_bid: self.bidding.team_has_bid(contractor.other()),
        });

        for (total, delta) in self.team_scores.iter_mut().zip(score.deltas) {
            *total += delta;
        }
        self.history.push(score);

        events.push(GameEvent::RoundCompleted {
            round: self.round,
            score,
            team_scores: self.team_scores,
        });

        if let Some(winner) = game_winner(self.team_scores, self.config.score_target, contractor) {
            self.phase = GamePhase::Finished { winner };
            events.push(GameEvent::GameEnded {
                winner,
                team_scores: self.team_scores,
            });
        } else {
            self.dealer = next_seat(self.dealer);
            self.round += 1;
            events.push(self.deal_round(Some(RedealReason::RoundScored)));
        }
        Ok(())
    }

    /// Clear round-scoped state, shuffle and deal, and open bidding
    fn deal_round(&mut self, reason: Option<RedealReason>) -> GameEvent {
        self.bidding = BiddingState::new();
        self.trump = None;
        self.contractor = None;
        self.current_trick = Trick::new();
        self.round_points = [0, 0];
        self.played_this_round.clear();

        let mut rng = StdRng::seed_from_u64(
            self.rng_seed ^ self.deals.wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        self.deals += 1;

        let first = next_seat(self.dealer);
        let deck = Deck::shuffled(self.config.deck_variant, &mut rng);
        let dealt = kitty::deal(deck, first, self.config.kitty_enabled());

        for (player, hand) in self.players.iter_mut().zip(dealt.hands) {
            player.hand = hand;
        }
        self.kitty = KittyState::new(dealt.kitty);

        self.phase = GamePhase::Bidding;
        self.current_player = first;

        GameEvent::RoundStarted {
            round: self.round,
            dealer: self.dealer,
            first_bidder: first,
            reason,
        }
    }

    /// Cards in hands, kitty, buried and played must add up to the deck
    pub fn check_conservation(&self) -> Result<(), GameError> {
        if self.phase == GamePhase::Waiting {
            return Ok(());
        }
        let held: usize = self.players.iter().map(|p| p.hand.len()).sum();
        let total = held
            + self.kitty.cards.len()
            + self.kitty.discards.len()
            + self.played_this_round.len();
        let expected = self.config.deck_variant.size();

        if total != expected {
            return Err(GameError::InvariantViolation(format!(
                "card count {total} does not match deck size {expected}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;

    fn humans() -> Vec<SeatConfig> {
        ["North", "East", "South", "West"]
            .into_iter()
            .map(SeatConfig::human)
            .collect()
    }

    fn started(config: GameConfig) -> GameState {
        let mut game = GameState::with_seed(config, humans(), 11).unwrap();
        game.dealer = 3;
        game.start().unwrap();
        game
    }

    #[test]
    fn test_new_game_waits_for_start() {
        let game = GameState::with_seed(GameConfig::default(), humans(), 1).unwrap();
        assert_eq!(game.phase, GamePhase::Waiting);
        assert!(game.players.iter().all(|p| p.hand.is_empty()));
    }

    #[test]
    fn test_rejects_wrong_seat_count() {
        let result = GameState::new(GameConfig::default(), humans()[..3].to_vec());
        assert_eq!(result.err(), Some(ConfigError::SeatCount(3)));
    }

    #[test]
    fn test_start_deals_and_opens_bidding() {
        let game = started(GameConfig::default());
        assert_eq!(game.phase, GamePhase::Bidding);
        assert_eq!(game.round, 1);
        assert_eq!(game.current_player, 0);
        assert!(game.players.iter().all(|p| p.hand.len() == 9));
        assert!(game.check_conservation().is_ok());
    }

    #[test]
    fn test_actions_before_start_are_rejected() {
        let mut game = GameState::with_seed(GameConfig::default(), humans(), 1).unwrap();
        let seat = game.current_player;
        assert_eq!(game.apply_action(seat, GameAction::Pass), Err(GameError::InvalidPhase));
    }

    #[test]
    fn test_wrong_turn_leaves_state_untouched() {
        let mut game = started(GameConfig::default());
        let before = serde_json::to_string(&game).unwrap();

        let result = game.apply_action(
            2,
            GameAction::Bid {
                points: 60,
                suit: Some(Suit::Hearts),
            },
        );
        assert_eq!(result, Err(GameError::NotYourTurn));
        assert_eq!(serde_json::to_string(&game).unwrap(), before);
    }

    #[test]
    fn test_zero_point_bid_is_pass() {
        let mut game = started(GameConfig::default());
        let events = game
            .apply_action(
                0,
                GameAction::Bid {
                    points: 0,
                    suit: None,
                },
            )
            .unwrap();
        assert_eq!(events, vec![GameEvent::Passed { seat: 0 }]);
        assert!(game.bidding.has_passed(0));
        assert_eq!(game.current_player, 1);
    }

    #[test]
    fn test_winning_bid_starts_play() {
        let mut game = started(GameConfig::default());
        game.apply_action(
            0,
            GameAction::Bid {
                points: 55,
                suit: Some(Suit::Hearts),
            },
        )
        .unwrap();
        for seat in 1..4 {
            game.apply_action(seat, GameAction::Pass).unwrap();
        }

        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.trump, Some(Suit::Hearts));
        assert_eq!(game.current_player, 0);
        assert_eq!(game.contractor, Some(Team::One));
    }

    #[test]
    fn test_all_pass_redeals() {
        let mut game = started(GameConfig::default());
        let first_hand = game.players[0].hand.clone();

        let mut events = Vec::new();
        for seat in 0..4 {
            events.extend(game.apply_action(seat, GameAction::Pass).unwrap());
        }

        assert_eq!(game.round, 2);
        assert_eq!(game.dealer, 0);
        assert_eq!(game.current_player, 1);
        assert_eq!(game.team_scores, [0, 0]);
        assert_eq!(game.phase, GamePhase::Bidding);
        assert!(game.bidding.passed.is_empty());
        assert_ne!(game.players[0].hand, first_hand);
        assert!(matches!(
            events.last(),
            Some(GameEvent::RoundStarted {
                reason: Some(RedealReason::AllPassed),
                ..
            })
        ));
    }

    #[test]
    fn test_follow_suit_enforced() {
        let mut game = started(GameConfig::default());
        game.apply_action(
            0,
            GameAction::Bid {
                points: 100,
                suit: Some(Suit::Spades),
            },
        )
        .unwrap();
        assert_eq!(game.phase, GamePhase::Playing);

        // Give seat 1 a heart and a club so following is forced
        let lead = Card::new(Suit::Hearts, Rank::Nine);
        let heart = Card::new(Suit::Hearts, Rank::Seven);
        let club = Card::new(Suit::Clubs, Rank::Seven);
        normalize_hand(&mut game, 1, &[heart, club]);
        normalize_hand(&mut game, 0, &[lead]);
        assert!(game.check_conservation().is_ok());

        game.apply_action(0, GameAction::PlayCard(lead)).unwrap();
        let before = game.players[1].hand.clone();
        assert_eq!(
            game.apply_action(1, GameAction::PlayCard(club)),
            Err(GameError::MustFollowSuit)
        );
        assert_eq!(game.players[1].hand, before);
        assert!(game.apply_action(1, GameAction::PlayCard(heart)).is_ok());
    }

    /// Swap the named cards into `seat`'s hand, trading them with whoever holds them
    fn normalize_hand(game: &mut GameState, seat: Seat, wanted: &[Card]) {
        for (slot, card) in wanted.iter().enumerate() {
            if game.players[seat as usize].hand[slot] == *card {
                continue;
            }
            let holder = game
                .players
                .iter()
                .position(|p| p.hand.contains(card))
                .unwrap();
            let pos = game.players[holder].hand.iter().position(|c| c == card).unwrap();
            let displaced = game.players[seat as usize].hand[slot];
            game.players[holder].hand[pos] = displaced;
            game.players[seat as usize].hand[slot] = *card;
        }
    }

    #[test]
    fn test_kitty_flow() {
        let mut game = started(GameConfig::with_kitty(200));
        assert_eq!(game.kitty.cards.len(), 4);
        assert!(game.players.iter().all(|p| p.hand.len() == 9));

        game.apply_action(
            0,
            GameAction::Bid {
                points: 70,
                suit: Some(Suit::Clubs),
            },
        )
        .unwrap();
        for seat in 1..4 {
            game.apply_action(seat, GameAction::Pass).unwrap();
        }
        assert_eq!(game.phase, GamePhase::Kitty { taken: false });
        assert_eq!(game.current_player, 0);

        let cards: Vec<Card> = game.players[0].hand[..4].to_vec();
        let discard = GameAction::DiscardToKitty {
            cards: cards.clone(),
            trump: Suit::Hearts,
        };
        assert_eq!(
            game.apply_action(0, discard.clone()),
            Err(GameError::KittyNotTaken)
        );
        assert_eq!(game.apply_action(1, GameAction::TakeKitty), Err(GameError::NotYourTurn));

        game.apply_action(0, GameAction::TakeKitty).unwrap();
        assert_eq!(game.players[0].hand.len(), 13);
        assert!(game.kitty.cards.is_empty());
        assert_eq!(
            game.apply_action(0, GameAction::TakeKitty),
            Err(GameError::KittyAlreadyTaken)
        );

        game.apply_action(0, discard).unwrap();
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.trump, Some(Suit::Hearts));
        assert_eq!(game.kitty.discards, cards);
        assert!(game.kitty.completed);
        assert_eq!(game.players[0].hand.len(), 9);
        assert_eq!(game.current_player, 0);
        assert!(game.check_conservation().is_ok());
    }

    #[test]
    fn test_valid_actions_by_phase() {
        let mut game = started(GameConfig::default());
        let actions = game.valid_actions(0);
        assert!(actions.contains(&GameAction::Pass));
        // 11 amounts from 50 to 100, four suits each, plus pass
        assert_eq!(actions.len(), 45);
        assert!(game.valid_actions(1).is_empty());

        game.apply_action(
            0,
            GameAction::Bid {
                points: 100,
                suit: Some(Suit::Spades),
            },
        )
        .unwrap();
        let plays = game.valid_actions(0);
        assert_eq!(plays.len(), 9);
        assert!(plays.iter().all(|a| matches!(a, GameAction::PlayCard(_))));
    }

    #[test]
    fn test_conservation_detects_lost_card() {
        let mut game = started(GameConfig::default());
        game.players[2].hand.pop();
        assert!(matches!(
            game.check_conservation(),
            Err(GameError::InvariantViolation(_))
        ));
        assert_eq!(
            GameError::InvariantViolation(String::new()).kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn test_view_hides_other_hands() {
        let game = started(GameConfig::with_kitty(300));
        let view = game.view_for(1).unwrap();
        assert_eq!(view.hand, game.players[1].hand);
        assert_eq!(view.hand_sizes, vec![9, 9, 9, 9]);
        assert_eq!(view.kitty_size, 4);
        assert!(game.view_for(4).is_none());
    }

    /// Every seat plays its first legal card until the round is scored
    fn play_round(game: &mut GameState) -> Vec<GameEvent> {
        let round = game.round;
        let mut events = Vec::new();
        while game.round == round && !game.is_finished() {
            let seat = game.current_player;
            let card = game.legal_plays(seat)[0];
            events.extend(game.apply_action(seat, GameAction::PlayCard(card)).unwrap());
        }
        events
    }

    fn north_wins_auction(game: &mut GameState, points: u32) {
        game.apply_action(
            0,
            GameAction::Bid {
                points,
                suit: Some(Suit::Hearts),
            },
        )
        .unwrap();
        for seat in 1..4 {
            game.apply_action(seat, GameAction::Pass).unwrap();
        }
    }

    fn round_score(events: &[GameEvent]) -> RoundScore {
        events
            .iter()
            .find_map(|e| match e {
                GameEvent::RoundCompleted { score, .. } => Some(*score),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_last_trick_survives_redeal() {
        let mut game = started(GameConfig::default());
        north_wins_auction(&mut game, 55);
        let events = play_round(&mut game);

        let ninth = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::TrickCompleted { trick, .. } => Some(trick.clone()),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(game.round, 2);
        assert_eq!(game.phase, GamePhase::Bidding);
        assert_eq!(game.last_trick, Some(ninth.clone()));
        assert_eq!(game.view_for(0).unwrap().last_trick, Some(ninth));
    }

    #[test]
    fn test_silent_defenders_at_hundred_score_nothing() {
        let mut game = started(GameConfig::default());
        game.team_scores = [0, 120];
        north_wins_auction(&mut game, 50);
        let score = round_score(&play_round(&mut game));

        assert_eq!(score.contractor, Team::One);
        assert!(score.anti_runaway);
        assert_eq!(score.deltas[1], 0);
        assert_eq!(game.team_scores[1], 120);
    }

    #[test]
    fn test_bidding_defenders_at_hundred_still_score() {
        let mut game = started(GameConfig::default());
        game.team_scores = [0, 120];
        for (seat, points) in [(0, 50), (1, 55), (2, 60)] {
            game.apply_action(
                seat,
                GameAction::Bid {
                    points,
                    suit: Some(Suit::Clubs),
                },
            )
            .unwrap();
        }
        for seat in [3, 0, 1] {
            game.apply_action(seat, GameAction::Pass).unwrap();
        }
        assert_eq!(game.contractor, Some(Team::One));

        let score = round_score(&play_round(&mut game));
        assert!(!score.anti_runaway);
        assert_eq!(score.deltas[1], score.defender_points as i32);
        assert_eq!(game.team_scores[1], 120 + score.defender_points as i32);
    }

    #[test]
    fn test_kitty_steps_check_turn_first() {
        let mut game = started(GameConfig::with_kitty(200));
        north_wins_auction(&mut game, 70);
        let discard = GameAction::DiscardToKitty {
            cards: game.players[1].hand[..4].to_vec(),
            trump: Suit::Hearts,
        };

        assert_eq!(game.apply_action(1, discard.clone()), Err(GameError::NotYourTurn));
        game.apply_action(0, GameAction::TakeKitty).unwrap();
        assert_eq!(game.apply_action(1, GameAction::TakeKitty), Err(GameError::NotYourTurn));
        assert_eq!(game.apply_action(2, GameAction::TakeKitty), Err(GameError::NotYourTurn));
        assert_eq!(game.apply_action(1, GameAction::Pass), Err(GameError::InvalidPhase));
    }
}
