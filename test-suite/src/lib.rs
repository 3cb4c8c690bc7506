//! Shared scenario builders and test setup for `feeprotocol-core`'s test
//! suites. Mirrors the original teacher's `setup_test()` convention, pared
//! down to what a pure, synchronous crate actually needs (no git
//! repository or network harness to stand up).

use feeprotocol_core::{
    Address, ContentHash, LeaderAction, LeaderActionRecord, Round, Rotation, Vote,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub mod scenarios;

/// Initializes `env_logger` exactly once per process; safe to call at
/// the top of every test.
pub fn setup_test() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Builds a single-rotation `Round` whose leader submits a `Receipt` and
/// whose own follow-up vote is `leader_vote`.
pub fn receipt_round(leader: Address, leader_vote: Vote, votes: Vec<(Address, Vote)>) -> Round {
    Round::new(vec![Rotation {
        leader: Some(leader),
        leader_action: Some(LeaderActionRecord {
            action: LeaderAction::Receipt(None),
            follow_up_vote: leader_vote,
        }),
        votes,
    }])
}

/// Builds a single-rotation `Round` whose leader times out.
pub fn leader_timeout_round(leader: Address) -> Round {
    Round::new(vec![Rotation {
        leader: Some(leader),
        leader_action: Some(LeaderActionRecord {
            action: LeaderAction::LeaderTimeout,
            follow_up_vote: Vote::Timeout,
        }),
        votes: vec![],
    }])
}

/// Builds a leader-appeal round: one or more rotations carrying only
/// `NotApplicable` content votes, with `Disagree(_)` votes cast against
/// the incumbent leader in earlier rotations to signal a successful
/// challenge.
pub fn leader_appeal_round(rotations: Vec<Vec<(Address, Vote)>>) -> Round {
    Round::new(
        rotations
            .into_iter()
            .map(|votes| Rotation {
                leader: None,
                leader_action: None,
                votes,
            })
            .collect(),
    )
}

/// Builds a validator-appeal round: no leader action, only content
/// votes.
pub fn validator_appeal_round(votes: Vec<(Address, Vote)>) -> Round {
    Round::new(vec![Rotation {
        leader: None,
        leader_action: None,
        votes,
    }])
}

/// A short-hand for an agreeing vote carrying no content hash, the
/// common case in scenarios that don't exercise deterministic-violation
/// detection.
pub fn agree() -> Vote {
    Vote::Agree(None)
}

pub fn disagree() -> Vote {
    Vote::Disagree(None)
}

pub fn agree_with_hash(hash: u64) -> Vote {
    Vote::Agree(Some(ContentHash(hash)))
}

/// `count` addresses starting at `start`, useful for building a
/// rotation's validator set without spelling out each `Address` literal.
pub fn address_range(start: u64, count: u64) -> Vec<Address> {
    (start..start + count).map(Address).collect()
}

/// Deterministically shuffles a round's votes under a seed, for property
/// tests asserting that the pipeline's totals don't depend on the order
/// validators happen to appear in (`spec.md` §8, "order independence").
pub fn shuffle_seeded(votes: &mut [(Address, Vote)], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    votes.shuffle(&mut rng);
}
