//! The core entry point: wires every component into the pure pipeline
//! described in `spec.md` §2 and §6.1.

use std::collections::HashMap;

use crate::adjust::{self, Adjustment};
use crate::bond;
use crate::classify::{self, Preliminary};
use crate::config::Config;
use crate::distribute::{self, RoundContext};
use crate::events::EventLogBuilder;
use crate::majority::{tally, Majority};
use crate::model::{Address, FeeEventLog, Rotation, Round, RoundLabel, TransactionBudget, Vote};
use crate::project::{self, Summary};
use crate::refund;
use crate::rewrite::{self, RewrittenTransaction};

/// Everything produced by [`process_transaction`], kept together because
/// the invariant registry needs all of it to evaluate its 22 checks.
pub struct PipelineState<'a> {
    pub participants: &'a [Address],
    pub rounds: &'a [Round],
    pub budget: &'a TransactionBudget,
    pub config: &'a Config,
    pub preliminary: Vec<Preliminary>,
    pub rewritten: RewrittenTransaction,
    pub round_sizes: Vec<u64>,
    /// `Some(bond)` for every round that is itself an appeal round.
    pub bonds: Vec<Option<u64>>,
    pub adjustments: Vec<Adjustment>,
    pub events: FeeEventLog,
    pub summary: Summary,
    pub total_cost: u64,
}

impl<'a> PipelineState<'a> {
    pub fn labels(&self) -> &[RoundLabel] {
        &self.rewritten.labels
    }
}

/// `(participants, rounds, budget) -> (fee_events, labels)`
/// (`spec.md` §6.1). Total, deterministic, no I/O. `reserves` supplies
/// the replacement address for every idle validator that can occur in
/// `rounds`; address generation is the caller's responsibility
/// (`spec.md` §1, Non-goals).
pub fn process_transaction<'a>(
    participants: &'a [Address],
    rounds: &'a [Round],
    budget: &'a TransactionBudget,
    reserves: &HashMap<Address, Address>,
    config: &'a Config,
) -> PipelineState<'a> {
    let preliminary = classify::classify_sequence(rounds);
    let rewritten = rewrite::rewrite(&preliminary);
    assert_eq!(
        rewritten.labels.len(),
        rounds.len(),
        "the rewriter must label every round exactly once"
    );

    let appeal_round_count = rewritten.labels.iter().filter(|l| l.is_appeal()).count();
    assert_eq!(
        budget.appeals.len(),
        appeal_round_count,
        "budget.appeals must have one entry per appeal-labeled round after rewriting"
    );

    let round_sizes = bond::compute_sizes(&preliminary, &rewritten);
    let bonds = compute_bonds(&rewritten, &round_sizes, budget);
    let residuals = compute_residuals(&rewritten, &bonds, rounds, budget);
    let suppress_residual_burn = referenced_rounds(&rewritten);

    let mut log = EventLogBuilder::new();
    let mut adjustments = Vec::with_capacity(rounds.len());
    let mut round_ceilings = Vec::with_capacity(rounds.len());

    for (index, round) in rounds.iter().enumerate() {
        let label = rewritten.labels[index];
        let rotation = round.last();
        let majority = round_majority(&preliminary[index], rotation);

        let adjustment = adjust::adjust(&rotation.votes, majority, reserves);
        emit_adjustment_events(&mut log, &adjustment, rotation, index, label, config, budget);
        adjustments.push(adjustment.clone());

        let filtered_votes: Vec<(Address, Vote)> = rotation
            .votes
            .iter()
            .filter(|(_, vote)| !vote.is_idle())
            .copied()
            .collect();
        let idle_count = (rotation.votes.len() - filtered_votes.len()) as u64;
        let active_count = filtered_votes.len() as u64;
        round_ceilings.push(refund::round_ceiling(label, majority, active_count, idle_count, budget));
        let filtered_round = Round::new(vec![Rotation {
            leader: rotation.leader,
            leader_action: rotation.leader_action,
            votes: filtered_votes,
        }]);

        let referenced = rewritten.reference[index];
        let ctx = RoundContext {
            index,
            label,
            majority,
            own_bond: bonds[index],
            referenced_bond: referenced.and_then(|r| residuals[r]),
            referenced_appealant: referenced.and_then(|r| appealant_of(&rewritten, budget, r)),
            appealant: appealant_of(&rewritten, budget, index),
            suppress_residual_burn: suppress_residual_burn[index],
        };
        distribute::distribute(&ctx, &filtered_round, budget, config, &mut log);
    }

    let posted_bonds: Vec<u64> = bonds.iter().filter_map(|b| *b).collect();
    let total_cost = refund::total_cost(&round_ceilings, &posted_bonds);
    let earned_and_burned = log.earned_and_burned();
    refund::apply_refund(&mut log, budget, total_cost, earned_and_burned);

    let events = log.finish();
    let summary = project::project(&events);

    PipelineState {
        participants,
        rounds,
        budget,
        config,
        preliminary,
        rewritten,
        round_sizes,
        bonds,
        adjustments,
        events,
        summary,
        total_cost,
    }
}

pub(crate) fn round_majority(preliminary: &Preliminary, rotation: &Rotation) -> Majority {
    match preliminary {
        Preliminary::NormalRound { majority } => *majority,
        Preliminary::AppealValidatorSuccessful | Preliminary::AppealValidatorUnsuccessful => {
            tally(rotation.votes.iter().map(|(_, v)| v))
        }
        _ => Majority::Undetermined,
    }
}

/// The bond for every appeal round, keyed by round index (`spec.md`
/// §4.4): `appeal_round_size(i) * validators_timeout + leader_timeout`,
/// where `i` is the appeal's ordinal (already folded into `round_sizes`
/// via [`bond::compute_sizes`]).
fn compute_bonds(
    rewritten: &RewrittenTransaction,
    round_sizes: &[u64],
    budget: &TransactionBudget,
) -> Vec<Option<u64>> {
    rewritten
        .labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            if label.is_appeal() {
                Some(round_sizes[index] * budget.validators_timeout + budget.leader_timeout)
            } else {
                None
            }
        })
        .collect()
}

fn appealant_of(
    rewritten: &RewrittenTransaction,
    budget: &TransactionBudget,
    index: usize,
) -> Option<Address> {
    rewritten
        .appeal_ordinal
        .get(index)
        .copied()
        .flatten()
        .and_then(|ordinal| budget.appeals.get(ordinal))
        .map(|record| record.appealant_address)
}

/// The unclaimed part of every unsuccessful appeal round's bond, i.e.
/// the bond minus what that round's own (non-idle) validators were
/// paid. This is the pool a later `*PreviousAppealBond` round draws
/// from; a round that nobody references burns it in its own
/// distribution instead (`spec.md` §4.6).
fn compute_residuals(
    rewritten: &RewrittenTransaction,
    bonds: &[Option<u64>],
    rounds: &[Round],
    budget: &TransactionBudget,
) -> Vec<Option<u64>> {
    rewritten
        .labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let unsuccessful = matches!(
                label,
                RoundLabel::AppealLeaderUnsuccessful
                    | RoundLabel::AppealLeaderTimeoutUnsuccessful
                    | RoundLabel::AppealValidatorUnsuccessful
            );
            if !unsuccessful {
                return None;
            }
            let bond = bonds[index].expect("unsuccessful appeal round always has a bond");
            let count = rounds[index]
                .last()
                .votes
                .iter()
                .filter(|(_, vote)| !vote.is_idle())
                .count() as u64;
            Some(bond.saturating_sub(budget.validators_timeout * count))
        })
        .collect()
}

/// Marks every round whose bond residual is claimed by a later
/// `*PreviousAppealBond` round, so that round's own distribution
/// strategy can skip burning a residual it no longer owns.
fn referenced_rounds(rewritten: &RewrittenTransaction) -> Vec<bool> {
    let mut referenced = vec![false; rewritten.labels.len()];
    for (index, label) in rewritten.labels.iter().enumerate() {
        let claims_previous_bond = matches!(
            label,
            RoundLabel::SplitPreviousAppealBond | RoundLabel::LeaderTimeout50PreviousAppealBond
        );
        if claims_previous_bond {
            if let Some(r) = rewritten.reference[index] {
                referenced[r] = true;
            }
        }
    }
    referenced
}

fn emit_adjustment_events(
    log: &mut EventLogBuilder,
    adjustment: &Adjustment,
    rotation: &Rotation,
    index: usize,
    label: RoundLabel,
    config: &Config,
    budget: &TransactionBudget,
) {
    use crate::events::EventDraft;
    use crate::model::Role;

    for replacement in &adjustment.idle_replacements {
        let mut slash = EventDraft::new(replacement.original, Some(index), Role::Validator);
        slash.round_label = Some(label);
        slash.vote = Some(Vote::Idle);
        slash.slashed = config.idle_penalty_coefficient * config.initial_stake;
        log.push(slash);

        let mut reward = EventDraft::new(replacement.reserve, Some(index), Role::Validator);
        reward.round_label = Some(label);
        reward.earned = budget.validators_timeout;
        log.push(reward);
    }

    for violator in &adjustment.deterministic_violators {
        let original_vote = rotation
            .votes
            .iter()
            .find(|(address, _)| address == violator)
            .map(|(_, vote)| *vote);
        let mut slash = EventDraft::new(*violator, Some(index), Role::Validator);
        slash.round_label = Some(label);
        slash.vote = original_vote;
        slash.slashed = config.deterministic_violation_penalty_coefficient * config.initial_stake;
        log.push(slash);
    }
}
