//! Universal properties from `spec.md` §8: determinism, conservation,
//! and a closed label set, checked over randomly generated single-round
//! transactions rather than the fixed S1-S6 fixtures.

use std::collections::HashMap;

use feeprotocol_core::{process_transaction, Address, Config, ContentHash, LeaderAction, LeaderActionRecord, Round, Rotation, TransactionBudget, StakingDistribution, Vote};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct GeneratedVote {
    idle: bool,
    disagree: bool,
    hash: u64,
}

fn arbitrary_vote() -> impl Strategy<Value = GeneratedVote> {
    (any::<bool>(), any::<bool>(), 0u64..3).prop_map(|(idle, disagree, hash)| GeneratedVote {
        idle,
        disagree,
        hash,
    })
}

fn arbitrary_round() -> impl Strategy<Value = (Round, TransactionBudget, HashMap<Address, Address>)> {
    (
        prop::collection::vec(arbitrary_vote(), 1..8),
        1u64..500,
        1u64..500,
    )
        .prop_map(|(votes, leader_timeout, validators_timeout)| {
            let leader = Address(0);
            let leader_hash = ContentHash(1);
            let mut reserves = HashMap::new();
            let validator_votes: Vec<(Address, Vote)> = votes
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let address = Address(i as u64 + 1);
                    let vote = if v.idle {
                        reserves.insert(address, Address(10_000 + i as u64));
                        Vote::Idle
                    } else if v.disagree {
                        Vote::Disagree(Some(ContentHash(v.hash)))
                    } else {
                        Vote::Agree(Some(ContentHash(v.hash)))
                    };
                    (address, vote)
                })
                .collect();
            let round = Round::new(vec![Rotation {
                leader: Some(leader),
                leader_action: Some(LeaderActionRecord {
                    action: LeaderAction::Receipt(Some(leader_hash)),
                    follow_up_vote: Vote::Agree(Some(leader_hash)),
                }),
                votes: validator_votes,
            }]);
            let budget = TransactionBudget {
                leader_timeout,
                validators_timeout,
                appeals: vec![],
                sender_address: Address(999_999),
                staking_distribution: StakingDistribution::Constant,
            };
            (round, budget, reserves)
        })
}

proptest! {
    #[test]
    fn processing_is_deterministic((round, budget, reserves) in arbitrary_round()) {
        let participants: Vec<Address> = (0..20).map(Address).collect();
        let config = Config::default();
        let rounds = [round];

        let a = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        let b = process_transaction(&participants, &rounds, &budget, &reserves, &config);

        prop_assert_eq!(a.events.events.len(), b.events.events.len());
        for (ea, eb) in a.events.iter().zip(b.events.iter()) {
            prop_assert_eq!(ea, eb);
        }
        prop_assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn every_run_conserves_the_budget((round, budget, reserves) in arbitrary_round()) {
        let participants: Vec<Address> = (0..20).map(Address).collect();
        let config = Config::default();
        let rounds = [round];

        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        let earned_and_burned: u64 = state.events.iter().map(|e| e.earned + e.burned).sum();
        prop_assert_eq!(earned_and_burned, state.total_cost);
        prop_assert!(feeprotocol_core::check_all(&state).is_empty());
    }

    #[test]
    fn sequence_ids_are_strictly_increasing((round, budget, reserves) in arbitrary_round()) {
        let participants: Vec<Address> = (0..20).map(Address).collect();
        let config = Config::default();
        let rounds = [round];

        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        let ids: Vec<u64> = state.events.iter().map(|e| e.sequence_id).collect();
        for window in ids.windows(2) {
            prop_assert!(window[0] < window[1]);
        }
    }
}

proptest! {
    #[test]
    fn round_size_tables_never_shrink(ordinal in 0usize..50) {
        let normal = feeprotocol_core::config::normal_round_size(ordinal);
        let next_normal = feeprotocol_core::config::normal_round_size(ordinal + 1);
        prop_assert!(next_normal >= normal);

        let appeal = feeprotocol_core::config::appeal_round_size(ordinal);
        let next_appeal = feeprotocol_core::config::appeal_round_size(ordinal + 1);
        prop_assert!(next_appeal >= appeal);
    }
}

#[test]
fn vote_order_does_not_affect_totals() {
    feeprotocol_test_suite::setup_test();
    let (mut rounds, budget) = feeprotocol_test_suite::scenarios::s1_plain_agree();
    let participants: Vec<Address> = (0..20).map(Address).collect();
    let config = Config::default();
    let reserves = HashMap::new();

    let baseline = process_transaction(&participants, &rounds, &budget, &reserves, &config);
    let baseline_totals = baseline.summary.totals.clone();

    let mut shuffled_votes = rounds[0].last().votes.clone();
    feeprotocol_test_suite::shuffle_seeded(&mut shuffled_votes, 7);
    rounds[0] = Round::new(vec![Rotation {
        leader: rounds[0].last().leader,
        leader_action: rounds[0].last().leader_action,
        votes: shuffled_votes,
    }]);

    let shuffled = process_transaction(&participants, &rounds, &budget, &reserves, &config);
    assert_eq!(shuffled.summary.totals, baseline_totals);
}
