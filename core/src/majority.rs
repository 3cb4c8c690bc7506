//! Tallies a round's votes into a winning majority, or `Undetermined`
//! (`spec.md` §4.1).

use crate::model::Vote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Majority {
    Agree,
    Disagree,
    Timeout,
    Undetermined,
}

/// Tallies the given votes, excluding `Idle` and `NotApplicable` (idle
/// votes are rewritten away by the idleness adjuster before labeling;
/// `NotApplicable` carries no content to tally).
pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Majority {
    let (mut agree, mut disagree, mut timeout) = (0u64, 0u64, 0u64);
    for vote in votes {
        match vote {
            Vote::Agree(_) => agree += 1,
            Vote::Disagree(_) => disagree += 1,
            Vote::Timeout => timeout += 1,
            Vote::Idle | Vote::NotApplicable => {}
        }
    }
    let counts = [
        (Majority::Agree, agree),
        (Majority::Disagree, disagree),
        (Majority::Timeout, timeout),
    ];
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    if max == 0 {
        return Majority::Undetermined;
    }
    let winners: Vec<_> = counts.iter().filter(|(_, c)| *c == max).collect();
    if winners.len() == 1 {
        winners[0].0
    } else {
        Majority::Undetermined
    }
}
