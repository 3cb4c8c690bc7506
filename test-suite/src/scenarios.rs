//! The concrete seed scenarios from `spec.md` §8, as reusable fixtures
//! for both the core crate's integration tests and this crate's property
//! tests.

use std::collections::HashMap;

use feeprotocol_core::{
    Address, AppealRecord, ContentHash, Round, Rotation, StakingDistribution, TransactionBudget,
    Vote,
};

use crate::{address_range, agree, disagree, leader_timeout_round, receipt_round};

pub const LEADER: Address = Address(1);
pub const SENDER: Address = Address(0);

fn budget(leader_timeout: u64, validators_timeout: u64, appeals: Vec<AppealRecord>) -> TransactionBudget {
    TransactionBudget {
        leader_timeout,
        validators_timeout,
        appeals,
        sender_address: SENDER,
        staking_distribution: StakingDistribution::Constant,
    }
}

/// S1 — plain agree: one normal round, 4 Agree / 1 Disagree.
pub fn s1_plain_agree() -> (Vec<Round>, TransactionBudget) {
    let validators = address_range(10, 5);
    let votes = vec![
        (validators[0], agree()),
        (validators[1], agree()),
        (validators[2], agree()),
        (validators[3], agree()),
        (validators[4], disagree()),
    ];
    let round = receipt_round(LEADER, agree(), votes);
    (vec![round], budget(100, 200, vec![]))
}

/// S2 — leader appeal success: `[Receipt+Agree, all-NA, Receipt+Disagree]`.
pub fn s2_leader_appeal_success() -> (Vec<Round>, TransactionBudget) {
    let appealant = Address(20);
    let normal = receipt_round(LEADER, agree(), vec![(Address(11), agree())]);
    let appeal = Round::new(vec![
        Rotation {
            leader: None,
            leader_action: None,
            votes: vec![(appealant, disagree())],
        },
        Rotation {
            leader: None,
            leader_action: None,
            votes: vec![(appealant, Vote::NotApplicable)],
        },
    ]);
    let new_leader = Address(2);
    let next = receipt_round(new_leader, disagree(), vec![(Address(12), agree())]);
    let appeals = vec![AppealRecord {
        appealant_address: appealant,
    }];
    (vec![normal, appeal, next], budget(100, 200, appeals))
}

/// S3 — validator appeal unsuccessful, resolving into
/// `SplitPreviousAppealBond`.
pub fn s3_validator_appeal_unsuccessful() -> (Vec<Round>, TransactionBudget) {
    let appealant = Address(30);
    let normal = receipt_round(
        LEADER,
        agree(),
        vec![(Address(11), agree()), (Address(12), agree())],
    );
    let appeal = Round::new(vec![Rotation {
        leader: None,
        leader_action: None,
        votes: vec![(appealant, agree()), (Address(13), agree())],
    }]);
    let next = receipt_round(
        Address(2),
        agree(),
        vec![(Address(14), agree()), (Address(15), disagree())],
    );
    let appeals = vec![AppealRecord {
        appealant_address: appealant,
    }];
    (vec![normal, appeal, next], budget(100, 200, appeals))
}

/// S4 — chained unsuccessful appeals: `[Normal, AppealVU, Normal,
/// AppealVU, Normal]`, each normal round with a clear, *consistent*
/// majority so every validator appeal against it fails.
pub fn s4_chained_unsuccessful_appeals() -> (Vec<Round>, TransactionBudget) {
    let appealant_1 = Address(40);
    let appealant_2 = Address(41);
    let normal_0 = receipt_round(LEADER, agree(), vec![(Address(11), agree())]);
    let appeal_0 = Round::new(vec![Rotation {
        leader: None,
        leader_action: None,
        votes: vec![(appealant_1, agree())],
    }]);
    let normal_1 = receipt_round(Address(2), agree(), vec![(Address(12), agree())]);
    let appeal_1 = Round::new(vec![Rotation {
        leader: None,
        leader_action: None,
        votes: vec![(appealant_2, agree())],
    }]);
    let normal_2 = receipt_round(Address(3), agree(), vec![(Address(13), agree())]);
    let appeals = vec![
        AppealRecord {
            appealant_address: appealant_1,
        },
        AppealRecord {
            appealant_address: appealant_2,
        },
    ];
    (
        vec![normal_0, appeal_0, normal_1, appeal_1, normal_2],
        budget(100, 200, appeals),
    )
}

/// S5 — sole leader timeout.
pub fn s5_sole_leader_timeout() -> (Vec<Round>, TransactionBudget) {
    (vec![leader_timeout_round(LEADER)], budget(100, 200, vec![]))
}

/// S6 — idle + deterministic violation: one validator idle, one
/// validator's hash disagrees with the leader's receipt hash. Returns
/// the reserve-address map alongside the rounds and budget.
pub fn s6_idle_and_violation() -> (Vec<Round>, TransactionBudget, HashMap<Address, Address>) {
    let idle_validator = Address(50);
    let violator = Address(51);
    let reserve = Address(999);
    let round = receipt_round(
        LEADER,
        Vote::Agree(Some(ContentHash(1))),
        vec![
            (Address(11), Vote::Agree(Some(ContentHash(1)))),
            (Address(12), Vote::Agree(Some(ContentHash(1)))),
            (idle_validator, Vote::Idle),
            (violator, Vote::Agree(Some(ContentHash(2)))),
        ],
    );
    let mut reserves = HashMap::new();
    reserves.insert(idle_validator, reserve);
    (vec![round], budget(100, 200, vec![]), reserves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeprotocol_core::{config::Config, pipeline::process_transaction, RoundLabel};
    use std::collections::HashMap;

    #[test]
    fn s1_labels_as_normal_round() {
        let (rounds, budget) = s1_plain_agree();
        let participants = address_range(1, 20);
        let config = Config::default();
        let reserves = HashMap::new();
        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        assert_eq!(state.labels(), &[RoundLabel::NormalRound]);
    }

    #[test]
    fn s5_labels_as_leader_timeout_50_percent() {
        let (rounds, budget) = s5_sole_leader_timeout();
        let participants = vec![LEADER];
        let config = Config::default();
        let reserves = HashMap::new();
        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        assert_eq!(state.labels(), &[RoundLabel::LeaderTimeout50Percent]);
    }
}
