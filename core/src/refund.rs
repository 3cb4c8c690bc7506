//! Unused-budget refund to the sender (`spec.md` §4.7).

use crate::events::{EventDraft, EventLogBuilder};
use crate::majority::Majority;
use crate::model::{FeeEventLog, Role, RoundLabel, TransactionBudget};

/// The sender-funded share of a single round's payout ceiling.
///
/// `active_count` is the round's non-idle validator count — the number
/// `crate::distribute`'s strategies actually iterate over for that
/// label. `idle_count` is added unconditionally at
/// `validators_timeout` each: an idle validator's reserve is paid that
/// quantum regardless of the round's label (`spec.md` §4.5), so it is
/// never funded by an appeal bond the way a label's own validator
/// payout sometimes is.
///
/// Unsuccessful-appeal labels contribute zero new money here: every
/// validator they pay, and everything they burn, is drawn from the
/// bond already counted once in [`total_cost`]'s own `bonds` sum (the
/// appeal round's own bond). `*PreviousAppealBond` labels likewise pay
/// their validators out of a referenced bond's residual, not the
/// sender's budget, so only their fixed `leader_timeout` award is new
/// money.
pub fn round_ceiling(
    label: RoundLabel,
    majority: Majority,
    active_count: u64,
    idle_count: u64,
    budget: &TransactionBudget,
) -> u64 {
    let leader_timeout = budget.leader_timeout;
    let validators_timeout = budget.validators_timeout;
    let label_cost = match label {
        RoundLabel::NormalRound => match majority {
            Majority::Agree | Majority::Disagree => {
                leader_timeout + validators_timeout * (active_count + 1)
            }
            Majority::Timeout | Majority::Undetermined => {
                leader_timeout + validators_timeout * active_count
            }
        },
        RoundLabel::SkipRound | RoundLabel::EmptyRound => 0,
        RoundLabel::AppealLeaderSuccessful | RoundLabel::AppealLeaderTimeoutSuccessful => {
            leader_timeout + validators_timeout * active_count
        }
        RoundLabel::AppealLeaderUnsuccessful
        | RoundLabel::AppealLeaderTimeoutUnsuccessful
        | RoundLabel::AppealValidatorUnsuccessful => 0,
        RoundLabel::AppealValidatorSuccessful => validators_timeout * active_count,
        RoundLabel::LeaderTimeout50Percent => leader_timeout,
        RoundLabel::LeaderTimeout150PreviousNormalRound => {
            (3 * leader_timeout) / 2 + validators_timeout * active_count
        }
        RoundLabel::LeaderTimeout50PreviousAppealBond | RoundLabel::SplitPreviousAppealBond => {
            leader_timeout
        }
    };
    label_cost + validators_timeout * idle_count
}

/// The sender's authorized maximum spend for the transaction: every
/// round's sender-funded ceiling (see [`round_ceiling`]) plus every
/// appeal bond (`spec.md` §4.7: "`Σ bonds_posted_by_sender`").
pub fn total_cost(round_ceilings: &[u64], bonds: &[u64]) -> u64 {
    let rounds_cost: u64 = round_ceilings.iter().sum();
    let bonds_cost: u64 = bonds.iter().sum();
    rounds_cost + bonds_cost
}

/// Appends the sender's cost/refund event. `total_cost` is the sender's
/// authorized spend (see [`total_cost`]); `earned_and_burned` is the sum
/// of every `earned` and `burned` field already emitted by round
/// strategies (leader, validator, and appealant roles — not the sender's
/// own event). The refund is `total_cost - earned_and_burned`, which must
/// never go negative: a negative result means a strategy over-spent the
/// budget, a specification/implementation bug, not a recoverable error.
pub fn apply_refund(
    log: &mut EventLogBuilder,
    budget: &TransactionBudget,
    total_cost: u64,
    earned_and_burned: u64,
) {
    assert!(
        earned_and_burned <= total_cost,
        "distribution spent more than the authorized budget: {earned_and_burned} > {total_cost}"
    );
    let refund = total_cost - earned_and_burned;
    let mut draft = EventDraft::new(budget.sender_address, None, Role::Sender);
    draft.cost = total_cost;
    draft.earned = refund;
    log.push(draft);
}

/// Sums every `earned` and `burned` field across the log so far (before
/// the sender's own event is appended).
pub fn earned_and_burned(log: &FeeEventLog) -> u64 {
    log.iter().map(|e| e.earned + e.burned).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, StakingDistribution};

    fn budget() -> TransactionBudget {
        TransactionBudget {
            leader_timeout: 100,
            validators_timeout: 200,
            appeals: vec![],
            sender_address: Address(1),
            staking_distribution: StakingDistribution::Constant,
        }
    }

    #[test]
    fn round_ceiling_normal_round_clear_majority_includes_the_leader_bonus() {
        let ceiling = round_ceiling(RoundLabel::NormalRound, Majority::Agree, 5, 0, &budget());
        assert_eq!(ceiling, 100 + 200 * 6); // leader_timeout + validators_timeout*(5+1)
    }

    #[test]
    fn round_ceiling_leader_timeout_50_percent_ignores_validator_count() {
        let ceiling = round_ceiling(RoundLabel::LeaderTimeout50Percent, Majority::Undetermined, 0, 0, &budget());
        assert_eq!(ceiling, 100);
    }

    #[test]
    fn round_ceiling_unsuccessful_appeal_contributes_no_new_money() {
        let ceiling = round_ceiling(
            RoundLabel::AppealValidatorUnsuccessful,
            Majority::Undetermined,
            3,
            0,
            &budget(),
        );
        assert_eq!(ceiling, 0);
    }

    #[test]
    fn round_ceiling_always_pays_idle_reserves_as_new_money() {
        let ceiling = round_ceiling(
            RoundLabel::AppealValidatorUnsuccessful,
            Majority::Undetermined,
            3,
            2,
            &budget(),
        );
        assert_eq!(ceiling, 200 * 2);
    }

    #[test]
    fn total_cost_sums_rounds_and_bonds() {
        let cost = total_cost(&[700], &[1_500]);
        assert_eq!(cost, 2_200);
    }

    #[test]
    fn refund_is_remainder_after_earn_and_burn() {
        let mut log = EventLogBuilder::new();
        apply_refund(&mut log, &budget(), 1_300, 1_300);
        let log = log.finish();
        assert_eq!(log.events[0].earned, 0);
    }

    #[test]
    #[should_panic(expected = "spent more than the authorized budget")]
    fn overspend_panics() {
        let mut log = EventLogBuilder::new();
        apply_refund(&mut log, &budget(), 100, 200);
    }
}
