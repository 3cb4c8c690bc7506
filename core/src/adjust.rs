//! Idleness replacement and deterministic-violation detection
//! (`spec.md` §4.5).
//!
//! Address generation is explicitly out of scope for the core (see
//! `spec.md` Non-goals); callers that want idle validators replaced must
//! supply the reserve address themselves via `reserves`. A round with an
//! idle vote and no matching reserve entry is a contract violation, not a
//! recoverable error — the caller built the `Round` wrong.

use std::collections::HashMap;

use crate::majority::Majority;
use crate::model::{Address, ContentHash, Vote};

/// One idle validator's replacement: `original` earns nothing further and
/// is slashed; `reserve` takes its seat with `vote: None`, excluded from
/// majority tallying, and earns the validators' timeout reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleReplacement {
    pub original: Address,
    pub reserve: Address,
}

/// The result of adjusting one rotation's votes for idleness and
/// deterministic violations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Adjustment {
    pub idle_replacements: Vec<IdleReplacement>,
    /// Addresses that voted in the round's winning direction but with a
    /// content hash that disagrees with the plurality of that direction's
    /// votes (`spec.md` §4.5: "deterministic violation").
    pub deterministic_violators: Vec<Address>,
}

/// Scans a rotation's votes for idle participants and deterministic
/// violations. `majority` is the already-tallied outcome for this
/// rotation; `reserves` maps every idle address present in `votes` to the
/// reserve address that should replace it.
pub fn adjust(
    votes: &[(Address, Vote)],
    majority: Majority,
    reserves: &HashMap<Address, Address>,
) -> Adjustment {
    let idle_replacements = votes
        .iter()
        .filter(|(_, vote)| vote.is_idle())
        .map(|(address, _)| {
            let reserve = *reserves.get(address).unwrap_or_else(|| {
                panic!("idle address {address:?} has no reserve replacement supplied")
            });
            IdleReplacement {
                original: *address,
                reserve,
            }
        })
        .collect();

    Adjustment {
        idle_replacements,
        deterministic_violators: deterministic_violators(votes, majority),
    }
}

/// Among votes cast in the round's winning direction, finds the most
/// common content hash (the canonical submission) and flags every
/// validator in that direction whose hash disagrees with it. A round with
/// no winning direction (`Majority::Undetermined` or `Timeout`) has no
/// content to agree or disagree on, so no violations are possible.
fn deterministic_violators(votes: &[(Address, Vote)], majority: Majority) -> Vec<Address> {
    let winning_hashes: Vec<(Address, Option<ContentHash>)> = votes
        .iter()
        .filter(|(_, vote)| matches!(
            (majority, vote),
            (Majority::Agree, Vote::Agree(_)) | (Majority::Disagree, Vote::Disagree(_))
        ))
        .map(|(address, vote)| (*address, vote.content_hash()))
        .collect();

    if winning_hashes.len() < 2 {
        return Vec::new();
    }

    let mut counts: HashMap<Option<ContentHash>, u64> = HashMap::new();
    for (_, hash) in &winning_hashes {
        *counts.entry(*hash).or_insert(0) += 1;
    }
    let canonical = counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(hash, _)| hash)
        .unwrap_or(None);

    winning_hashes
        .into_iter()
        .filter(|(_, hash)| *hash != canonical)
        .map(|(address, _)| address)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_vote_is_replaced_from_reserve_map() {
        let votes = vec![(Address(1), Vote::Idle), (Address(2), Vote::Agree(None))];
        let mut reserves = HashMap::new();
        reserves.insert(Address(1), Address(100));
        let adjustment = adjust(&votes, Majority::Agree, &reserves);
        assert_eq!(
            adjustment.idle_replacements,
            vec![IdleReplacement {
                original: Address(1),
                reserve: Address(100)
            }]
        );
    }

    #[test]
    #[should_panic(expected = "no reserve replacement supplied")]
    fn idle_vote_without_reserve_panics() {
        let votes = vec![(Address(1), Vote::Idle)];
        let reserves = HashMap::new();
        adjust(&votes, Majority::Undetermined, &reserves);
    }

    #[test]
    fn minority_hash_among_winning_direction_is_a_violation() {
        let votes = vec![
            (Address(1), Vote::Agree(Some(ContentHash(1)))),
            (Address(2), Vote::Agree(Some(ContentHash(1)))),
            (Address(3), Vote::Agree(Some(ContentHash(2)))),
            (Address(4), Vote::Disagree(Some(ContentHash(9)))),
        ];
        let reserves = HashMap::new();
        let adjustment = adjust(&votes, Majority::Agree, &reserves);
        assert_eq!(adjustment.deterministic_violators, vec![Address(3)]);
    }

    #[test]
    fn unanimous_agreement_has_no_violators() {
        let votes = vec![
            (Address(1), Vote::Agree(Some(ContentHash(1)))),
            (Address(2), Vote::Agree(Some(ContentHash(1)))),
        ];
        let reserves = HashMap::new();
        let adjustment = adjust(&votes, Majority::Agree, &reserves);
        assert!(adjustment.deterministic_violators.is_empty());
    }

    #[test]
    fn undetermined_majority_has_no_violators() {
        let votes = vec![
            (Address(1), Vote::Agree(Some(ContentHash(1)))),
            (Address(2), Vote::Disagree(Some(ContentHash(2)))),
        ];
        let reserves = HashMap::new();
        let adjustment = adjust(&votes, Majority::Undetermined, &reserves);
        assert!(adjustment.deterministic_violators.is_empty());
    }
}
