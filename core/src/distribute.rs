//! Per-label distribution strategies (`spec.md` §4.6). Each strategy
//! consumes one round's already-resolved label plus whatever cross-round
//! context it references (a bond, an appealant, the round's own tallied
//! majority) and appends [`crate::events::EventDraft`]s to the shared log.

use crate::config::Config;
use crate::events::{EventDraft, EventLogBuilder};
use crate::majority::Majority;
use crate::model::{Address, Role, Round, RoundLabel, TransactionBudget, Vote};

/// Everything a single round's strategy needs beyond the round's own
/// votes: its tallied majority (for label variants that branch on it),
/// the bond it posted if it is itself an appeal round, the bond of the
/// earlier appeal round it references (for the `*PreviousAppealBond`
/// labels), and the appealant address if it is an appeal round.
///
/// `referenced_bond` is already net of what the referenced appeal
/// round's own validators were paid: a single unsuccessful appeal's
/// bond is spent exactly once, either burned in its own round or handed
/// forward to the round that references it, never both
/// (`suppress_residual_burn` marks the former case so the appeal round
/// knows not to burn what it no longer owns).
#[derive(Debug, Clone, Copy)]
pub struct RoundContext {
    pub index: usize,
    pub label: RoundLabel,
    pub majority: Majority,
    pub own_bond: Option<u64>,
    pub referenced_bond: Option<u64>,
    pub referenced_appealant: Option<Address>,
    pub appealant: Option<Address>,
    pub suppress_residual_burn: bool,
}

pub fn distribute(
    ctx: &RoundContext,
    round: &Round,
    budget: &TransactionBudget,
    config: &Config,
    log: &mut EventLogBuilder,
) {
    let rotation = round.last();
    let leader = rotation.leader;
    let leader_timeout = budget.leader_timeout;
    let validators_timeout = budget.validators_timeout;

    match ctx.label {
        RoundLabel::NormalRound => match ctx.majority {
            Majority::Agree | Majority::Disagree => {
                let winner = ctx.majority;
                emit_leader(log, leader, ctx, leader_timeout + validators_timeout, 0, 0);
                for (address, vote) in &rotation.votes {
                    if votes_for(vote, winner) {
                        emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
                    } else {
                        let burn = config.penalty_reward_coefficient * validators_timeout;
                        emit_validator_burn(log, *address, ctx, *vote, burn);
                    }
                }
            }
            Majority::Timeout | Majority::Undetermined => {
                emit_leader(log, leader, ctx, leader_timeout, 0, 0);
                for (address, vote) in &rotation.votes {
                    emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
                }
            }
        },

        RoundLabel::SkipRound | RoundLabel::EmptyRound => {}

        RoundLabel::AppealLeaderSuccessful | RoundLabel::AppealLeaderTimeoutSuccessful => {
            let bond = ctx.own_bond.expect("successful appeal round always has its own bond");
            let appealant = ctx.appealant.expect("appeal round always has an appealant");
            emit_appealant_earn(log, appealant, ctx, bond + leader_timeout);
            for (address, vote) in &rotation.votes {
                emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
            }
        }

        RoundLabel::AppealLeaderUnsuccessful | RoundLabel::AppealLeaderTimeoutUnsuccessful => {
            let bond = ctx.own_bond.expect("unsuccessful appeal round always has its own bond");
            let appealant = ctx.appealant.expect("appeal round always has an appealant");
            let count = rotation.votes.len() as u64;
            let paid_to_validators = validators_timeout * count;
            // The appealant's bond leaves their balance exactly once: as
            // cost for the share validators are paid, and as a burn for
            // whatever is left over. Charging the full bond as cost and
            // then burning the residual on top would debit them twice.
            emit_appealant_cost(log, appealant, ctx, paid_to_validators);
            for (address, vote) in &rotation.votes {
                emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
            }
            if !ctx.suppress_residual_burn {
                let residual = bond.saturating_sub(paid_to_validators);
                if residual > 0 {
                    emit_appealant_burn(log, appealant, ctx, residual);
                }
            }
        }

        RoundLabel::AppealValidatorSuccessful => {
            let bond = ctx.own_bond.expect("successful appeal round always has its own bond");
            let appealant = ctx.appealant.expect("appeal round always has an appealant");
            emit_appealant_earn(log, appealant, ctx, bond);
            for (address, vote) in &rotation.votes {
                if votes_for(vote, ctx.majority) {
                    emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
                } else {
                    let burn = config.penalty_reward_coefficient * validators_timeout;
                    emit_validator_burn(log, *address, ctx, *vote, burn);
                }
            }
        }

        RoundLabel::AppealValidatorUnsuccessful => {
            let bond = ctx.own_bond.expect("unsuccessful appeal round always has its own bond");
            let appealant = ctx.appealant.expect("appeal round always has an appealant");
            let count = rotation.votes.len() as u64;
            let paid_to_validators = validators_timeout * count;
            emit_appealant_cost(log, appealant, ctx, paid_to_validators);
            for (address, vote) in &rotation.votes {
                emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
            }
            if !ctx.suppress_residual_burn {
                let residual = bond.saturating_sub(paid_to_validators);
                if residual > 0 {
                    emit_appealant_burn(log, appealant, ctx, residual);
                }
            }
        }

        RoundLabel::LeaderTimeout50Percent => {
            // The other half is not burned: it flows back to the sender
            // through the refund calculation (`spec.md` §4.6, §4.7).
            emit_leader(log, leader, ctx, leader_timeout / 2, 0, 0);
        }

        RoundLabel::LeaderTimeout150PreviousNormalRound => {
            let amount = (3 * leader_timeout) / 2;
            emit_leader(log, leader, ctx, amount, 0, 0);
            for (address, vote) in &rotation.votes {
                emit_validator_earn(log, *address, ctx, *vote, validators_timeout);
            }
        }

        RoundLabel::LeaderTimeout50PreviousAppealBond => {
            let residual = ctx
                .referenced_bond
                .expect("LeaderTimeout50PreviousAppealBond always references a prior bond");
            let half_to_validators = residual / 2;
            let half_burned = residual - half_to_validators;
            emit_leader(log, leader, ctx, leader_timeout, 0, 0);
            split_bond_among_validators(log, rotation, ctx, half_to_validators, leader);
            if half_burned > 0 {
                let referenced_appealant = ctx
                    .referenced_appealant
                    .expect("LeaderTimeout50PreviousAppealBond always references a prior appealant");
                emit_appealant_burn(log, referenced_appealant, ctx, half_burned);
            }
        }

        RoundLabel::SplitPreviousAppealBond => {
            let residual = ctx
                .referenced_bond
                .expect("SplitPreviousAppealBond always references a prior bond");
            emit_leader(log, leader, ctx, leader_timeout, 0, 0);
            split_bond_among_validators(log, rotation, ctx, residual, leader);
        }
    }
}

fn votes_for(vote: &Vote, majority: Majority) -> bool {
    matches!(
        (majority, vote),
        (Majority::Agree, Vote::Agree(_))
            | (Majority::Disagree, Vote::Disagree(_))
            | (Majority::Timeout, Vote::Timeout)
    )
}

/// Splits `pool` equally across every validator in `rotation`, burning the
/// floor-division remainder (`spec.md` §9, "integer arithmetic and
/// dust"). The remainder is attributed to the round's leader, the only
/// other participant in these label variants.
fn split_bond_among_validators(
    log: &mut EventLogBuilder,
    rotation: &crate::model::Rotation,
    ctx: &RoundContext,
    pool: u64,
    leader: Option<Address>,
) {
    let count = rotation.votes.len() as u64;
    assert!(count > 0, "a split-bond round must have validators to split among");
    let share = pool / count;
    let remainder = pool % count;
    for (address, vote) in &rotation.votes {
        emit_validator_earn(log, *address, ctx, *vote, share);
    }
    if remainder > 0 {
        if let Some(leader) = leader {
            emit_leader(log, Some(leader), ctx, 0, 0, remainder);
        }
    }
}

fn emit_leader(
    log: &mut EventLogBuilder,
    leader: Option<Address>,
    ctx: &RoundContext,
    earned: u64,
    cost: u64,
    burned: u64,
) {
    let Some(leader) = leader else {
        return;
    };
    let mut draft = EventDraft::new(leader, Some(ctx.index), Role::Leader);
    draft.round_label = Some(ctx.label);
    draft.earned = earned;
    draft.cost = cost;
    draft.burned = burned;
    log.push(draft);
}

fn emit_validator_earn(
    log: &mut EventLogBuilder,
    address: Address,
    ctx: &RoundContext,
    vote: Vote,
    earned: u64,
) {
    let mut draft = EventDraft::new(address, Some(ctx.index), Role::Validator);
    draft.round_label = Some(ctx.label);
    draft.vote = Some(vote);
    draft.earned = earned;
    log.push(draft);
}

fn emit_validator_burn(
    log: &mut EventLogBuilder,
    address: Address,
    ctx: &RoundContext,
    vote: Vote,
    burned: u64,
) {
    let mut draft = EventDraft::new(address, Some(ctx.index), Role::Validator);
    draft.round_label = Some(ctx.label);
    draft.vote = Some(vote);
    draft.burned = burned;
    log.push(draft);
}

fn emit_appealant_earn(log: &mut EventLogBuilder, address: Address, ctx: &RoundContext, earned: u64) {
    let mut draft = EventDraft::new(address, Some(ctx.index), Role::Appealant);
    draft.round_label = Some(ctx.label);
    draft.earned = earned;
    log.push(draft);
}

fn emit_appealant_cost(log: &mut EventLogBuilder, address: Address, ctx: &RoundContext, cost: u64) {
    let mut draft = EventDraft::new(address, Some(ctx.index), Role::Appealant);
    draft.round_label = Some(ctx.label);
    draft.cost = cost;
    log.push(draft);
}

fn emit_appealant_burn(log: &mut EventLogBuilder, address: Address, ctx: &RoundContext, burned: u64) {
    let mut draft = EventDraft::new(address, Some(ctx.index), Role::Appealant);
    draft.round_label = Some(ctx.label);
    draft.burned = burned;
    log.push(draft);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaderAction, LeaderActionRecord, Rotation, StakingDistribution};

    fn budget() -> TransactionBudget {
        TransactionBudget {
            leader_timeout: 100,
            validators_timeout: 200,
            appeals: vec![],
            sender_address: Address(999),
            staking_distribution: StakingDistribution::Constant,
        }
    }

    fn round_with_votes(votes: Vec<(Address, Vote)>) -> Round {
        Round::new(vec![Rotation {
            leader: Some(Address(1)),
            leader_action: Some(LeaderActionRecord {
                action: LeaderAction::Receipt(None),
                follow_up_vote: Vote::Agree(None),
            }),
            votes,
        }])
    }

    #[test]
    fn normal_round_clear_majority_pays_leader_and_splits_majority_minority() {
        let round = round_with_votes(vec![
            (Address(2), Vote::Agree(None)),
            (Address(3), Vote::Agree(None)),
            (Address(4), Vote::Disagree(None)),
        ]);
        let ctx = RoundContext {
            index: 0,
            label: RoundLabel::NormalRound,
            majority: Majority::Agree,
            own_bond: None,
            referenced_bond: None,
            appealant: None,
            referenced_appealant: None,
            suppress_residual_burn: false,
        };
        let mut log = EventLogBuilder::new();
        distribute(&ctx, &round, &budget(), &Config::default(), &mut log);
        let log = log.finish();
        let leader_event = log.iter().find(|e| e.role == Role::Leader).unwrap();
        assert_eq!(leader_event.earned, 300);
        let burned: u64 = log.iter().map(|e| e.burned).sum();
        assert_eq!(burned, 200);
        let earned: u64 = log.iter().map(|e| e.earned).sum();
        assert_eq!(earned, 300 + 200 + 200);
    }

    #[test]
    fn skip_round_emits_nothing() {
        let round = round_with_votes(vec![(Address(2), Vote::Agree(None))]);
        let ctx = RoundContext {
            index: 0,
            label: RoundLabel::SkipRound,
            majority: Majority::Agree,
            own_bond: None,
            referenced_bond: None,
            appealant: None,
            referenced_appealant: None,
            suppress_residual_burn: false,
        };
        let mut log = EventLogBuilder::new();
        distribute(&ctx, &round, &budget(), &Config::default(), &mut log);
        assert!(log.finish().events.is_empty());
    }

    #[test]
    fn leader_timeout_150_uses_floor_division() {
        let mut b = budget();
        b.leader_timeout = 101;
        let round = round_with_votes(vec![(Address(2), Vote::Agree(None))]);
        let ctx = RoundContext {
            index: 1,
            label: RoundLabel::LeaderTimeout150PreviousNormalRound,
            majority: Majority::Agree,
            own_bond: None,
            referenced_bond: None,
            appealant: None,
            referenced_appealant: None,
            suppress_residual_burn: false,
        };
        let mut log = EventLogBuilder::new();
        distribute(&ctx, &round, &b, &Config::default(), &mut log);
        let leader_event = log
            .finish()
            .events
            .into_iter()
            .find(|e| e.role == Role::Leader)
            .unwrap();
        assert_eq!(leader_event.earned, 151); // floor(3*101/2) = 151
    }

    #[test]
    fn split_previous_appeal_bond_burns_remainder_to_leader() {
        let round = round_with_votes(vec![
            (Address(2), Vote::Agree(None)),
            (Address(3), Vote::Agree(None)),
            (Address(4), Vote::Agree(None)),
        ]);
        let ctx = RoundContext {
            index: 2,
            label: RoundLabel::SplitPreviousAppealBond,
            majority: Majority::Undetermined,
            own_bond: None,
            referenced_bond: Some(10),
            appealant: None,
            referenced_appealant: None,
            suppress_residual_burn: false,
        };
        let mut log = EventLogBuilder::new();
        distribute(&ctx, &round, &budget(), &Config::default(), &mut log);
        let log = log.finish();
        let validator_total: u64 = log
            .iter()
            .filter(|e| e.role == Role::Validator)
            .map(|e| e.earned)
            .sum();
        assert_eq!(validator_total, 9); // 10 / 3 = 3 each
        let leader_burn: u64 = log
            .iter()
            .filter(|e| e.role == Role::Leader)
            .map(|e| e.burned)
            .sum();
        assert_eq!(leader_burn, 1);
    }

    #[test]
    fn appeal_leader_unsuccessful_burns_residual_bond() {
        let round = round_with_votes(vec![(Address(2), Vote::NotApplicable)]);
        let ctx = RoundContext {
            index: 1,
            label: RoundLabel::AppealLeaderUnsuccessful,
            majority: Majority::Undetermined,
            own_bond: Some(1_000),
            referenced_bond: None,
            appealant: Some(Address(7)),
            referenced_appealant: None,
            suppress_residual_burn: false,
        };
        let mut log = EventLogBuilder::new();
        distribute(&ctx, &round, &budget(), &Config::default(), &mut log);
        let log = log.finish();
        let appealant_cost: u64 = log
            .iter()
            .filter(|e| e.role == Role::Appealant)
            .map(|e| e.cost)
            .sum();
        assert_eq!(appealant_cost, 200); // only the share actually paid to validators
        let appealant_burn: u64 = log
            .iter()
            .filter(|e| e.role == Role::Appealant)
            .map(|e| e.burned)
            .sum();
        assert_eq!(appealant_burn, 1_000 - 200); // the rest of the bond, burned once
    }
}
