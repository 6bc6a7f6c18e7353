//! Round scoring and game-end detection.
//!
//! The contractors score their card points if they reach the bid and lose
//! the bid otherwise. Defenders score their card points plus anything buried
//! in the kitty, except that a defending team already on 100 or more that
//! did not bid this round scores nothing.

use crate::bidding::Bid;
use crate::player::Team;
use serde::{Deserialize, Serialize};

/// Cumulative score at which non-bidding defenders stop scoring
pub const ANTI_RUNAWAY_THRESHOLD: i32 = 100;

/// Everything the scorer needs about a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTally {
    pub bid: Bid,
    pub contractor: Team,
    /// Card points taken in tricks, indexed by team
    pub round_points: [u32; 2],
    /// Points buried in the kitty
    pub kitty_points: u32,
    /// Cumulative scores before this round, indexed by team
    pub scores_before: [i32; 2],
    /// Whether the defending team placed any bid this round
    pub defenders_bid: bool,
}

/// Outcome of scoring one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub contractor: Team,
    pub bid: u32,
    pub contractor_points: u32,
    pub defender_points: u32,
    pub kitty_points: u32,
    pub made_contract: bool,
    pub anti_runaway: bool,
    /// Score changes, indexed by team
    pub deltas: [i32; 2],
}

/// Convert round card points into team score deltas
pub fn score_round(tally: &RoundTally) -> RoundScore {
    let contractor = tally.contractor;
    let defender = contractor.other();
    let bid = tally.bid.points;

    let contractor_points = tally.round_points[contractor.index()];
    let defender_points = tally.round_points[defender.index()];

    let made_contract = contractor_points >= bid;
    let contractor_delta = if made_contract {
        contractor_points as i32
    } else {
        -(bid as i32)
    };

    let anti_runaway = tally.scores_before[defender.index()] >= ANTI_RUNAWAY_THRESHOLD
        && !tally.defenders_bid;
    let defender_delta = if anti_runaway {
        0
    } else {
        (defender_points + tally.kitty_points) as i32
    };

    let mut deltas = [0; 2];
    deltas[contractor.index()] = contractor_delta;
    deltas[defender.index()] = defender_delta;

    RoundScore {
        contractor,
        bid,
        contractor_points,
        defender_points,
        kitty_points: tally.kitty_points,
        made_contract,
        anti_runaway,
        deltas,
    }
}

/// Decide whether the game is over after scores were updated.
///
/// Reaching `+target` wins; falling to `-target` loses, handing the game to
/// the other team. If both teams cross the positive line in the same round
/// the higher score wins, with ties going to the contractors.
pub fn game_winner(scores: [i32; 2], target: i32, contractor: Team) -> Option<Team> {
    let reached: Vec<Team> = [Team::One, Team::Two]
        .into_iter()
        .filter(|t| scores[t.index()] >= target)
        .collect();

    match reached.as_slice() {
        [team] => return Some(*team),
        [_, _] => {
            let (one, two) = (scores[0], scores[1]);
            return Some(if one > two {
                Team::One
            } else if two > one {
                Team::Two
            } else {
                contractor
            });
        }
        _ => {}
    }

    [Team::One, Team::Two]
        .into_iter()
        .find(|t| scores[t.index()] <= -target)
        .map(Team::other)
}
