//! The 22-invariant registry (`spec.md` §4.8). Each invariant is a total
//! function over the final pipeline state; a violation is a value
//! returned to the caller, never a propagated error (`spec.md` §7).

use std::collections::{BTreeMap, HashSet};

use crate::majority::Majority;
use crate::model::{Role, RoundLabel, Vote};
use crate::pipeline::{round_majority, PipelineState};
use crate::refund::round_ceiling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Financial,
    State,
    Fairness,
    Performance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub id: &'static str,
    pub message: String,
    pub severity: Severity,
    pub group: Group,
    pub context: BTreeMap<String, i128>,
}

/// One named, quantified property over the final state. Implementations
/// must stay free of dependencies on other invariants' outcomes
/// (`spec.md` §9).
pub trait Invariant {
    fn id(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn group(&self) -> Group;
    fn check(&self, state: &PipelineState) -> Option<Violation>;
}

fn violation(
    id: &'static str,
    severity: Severity,
    group: Group,
    message: String,
    context: BTreeMap<String, i128>,
) -> Violation {
    Violation {
        id,
        message,
        severity,
        group,
        context,
    }
}

macro_rules! ctx {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = BTreeMap::new();
        $(map.insert($key.to_string(), $value as i128);)*
        map
    }};
}

/// Returns every invariant in the registry, in the order `spec.md` §4.8
/// lists them.
pub fn all() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(Conservation),
        Box::new(NonNegativeBalance),
        Box::new(AppealBondCoverage),
        Box::new(MajorityMinorityConsistency),
        Box::new(RoleExclusivity),
        Box::new(SequentialProcessing),
        Box::new(AppealFollowsNormal),
        Box::new(BurnNonNegativity),
        Box::new(RefundNonNegativity),
        Box::new(VoteConsistency),
        Box::new(IdleSlashingCorrectness),
        Box::new(DeterministicViolationSlashing),
        Box::new(LeaderTimeoutEarningLimit),
        Box::new(AppealBondInternalConsistency),
        Box::new(RoundSizeConsistency),
        Box::new(StrictlyIncreasingSequenceId),
        Box::new(StakeImmutability),
        Box::new(LabelValidity),
        Box::new(NoDoublePenalties),
        Box::new(EarningJustification),
        Box::new(CostAccounting),
        Box::new(SlashingProportionality),
    ]
}

pub fn check_all(state: &PipelineState) -> Vec<Violation> {
    all().iter().filter_map(|inv| inv.check(state)).collect()
}

pub fn check_group(state: &PipelineState, group: Group) -> Vec<Violation> {
    all()
        .iter()
        .filter(|inv| inv.group() == group)
        .filter_map(|inv| inv.check(state))
        .collect()
}

pub fn check_critical_only(state: &PipelineState) -> Vec<Violation> {
    all()
        .iter()
        .filter(|inv| inv.severity() == Severity::Critical)
        .filter_map(|inv| inv.check(state))
        .collect()
}

/// Recomputes the transaction's authorized ceiling directly from its
/// rounds, labels, and bonds, without reading [`PipelineState::total_cost`]
/// — the value the refund calculation itself produced. Shared by
/// [`Conservation`], which checks it against what was actually earned and
/// burned, and [`CostAccounting`], which checks it against the stored
/// field.
fn recompute_total_cost(state: &PipelineState) -> u64 {
    let rounds_cost: u64 = state
        .rounds
        .iter()
        .enumerate()
        .map(|(index, round)| {
            let rotation = round.last();
            let majority = round_majority(&state.preliminary[index], rotation);
            let idle_count = rotation.votes.iter().filter(|(_, v)| v.is_idle()).count() as u64;
            let active_count = rotation.votes.len() as u64 - idle_count;
            round_ceiling(state.labels()[index], majority, active_count, idle_count, state.budget)
        })
        .sum();
    let bonds_cost: u64 = state.bonds.iter().filter_map(|b| *b).sum();
    rounds_cost + bonds_cost
}

/// 1. The transaction's authorized ceiling, recomputed independently from
/// round data, equals `Σ earned + Σ burned` (the sender's own refund
/// event is itself an `earned` entry, so this single equality subsumes
/// `spec.md`'s "`cost_paid_by_sender = earned_by_all + burned_by_all +
/// refund`"). Deliberately does not read [`PipelineState::total_cost`]:
/// that field is an input to the refund event that produced the right-hand
/// side, so comparing against it directly would hold by construction.
struct Conservation;
impl Invariant for Conservation {
    fn id(&self) -> &'static str {
        "conservation"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let left = recompute_total_cost(state);
        let right = state.summary.totals.earned + state.summary.totals.burned;
        if left == right {
            return None;
        }
        Some(violation(
            self.id(),
            self.severity(),
            self.group(),
            format!("recomputed total_cost {left} != earned+burned {right}"),
            ctx!("total_cost" => left, "earned_plus_burned" => right),
        ))
    }
}

/// 2. Every address's cumulative `earned - cost - burned - slashed` stays
/// non-negative, excluding the sender and any bond-posting appealant: both
/// deposit money upfront (the transaction budget, an appeal bond) that is
/// never itself recorded as a prior `earned` event, so their own net is
/// expected to run negative by the size of that deposit (`spec.md`
/// §4.8(2) measures the sender and appealants against their deposit, not
/// against zero).
struct NonNegativeBalance;
impl Invariant for NonNegativeBalance {
    fn id(&self) -> &'static str {
        "non_negative_balance"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let depositors: HashSet<_> = state
            .events
            .iter()
            .filter(|e| matches!(e.role, Role::Sender | Role::Appealant))
            .map(|e| e.address)
            .collect();
        for (address, balance) in &state.summary.balances {
            if depositors.contains(address) {
                continue;
            }
            let net = balance.net();
            if net < 0 {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("address {address:?} has negative balance {net}"),
                    ctx!("address" => address.0, "net" => net),
                ));
            }
        }
        None
    }
}

/// 3. Every appeal round's bond covers `size * validators_timeout +
/// leader_timeout`.
struct AppealBondCoverage;
impl Invariant for AppealBondCoverage {
    fn id(&self) -> &'static str {
        "appeal_bond_coverage"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, bond) in state.bonds.iter().enumerate() {
            let Some(bond) = bond else { continue };
            let required =
                state.round_sizes[index] * state.budget.validators_timeout + state.budget.leader_timeout;
            if *bond < required {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("round {index} bond {bond} is below required {required}"),
                    ctx!("round_index" => index, "bond" => *bond, "required" => required),
                ));
            }
        }
        None
    }
}

/// 4. In a `NormalRound` with a clear majority, the sum of minority burns
/// equals `PENALTY_REWARD * |minority| * validators_timeout`.
struct MajorityMinorityConsistency;
impl Invariant for MajorityMinorityConsistency {
    fn id(&self) -> &'static str {
        "majority_minority_consistency"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::Fairness
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, round) in state.rounds.iter().enumerate() {
            let majority = match &state.preliminary[index] {
                crate::classify::Preliminary::NormalRound { majority } => *majority,
                _ => continue,
            };
            if matches!(majority, Majority::Undetermined) {
                continue;
            }
            let rotation = round.last();
            let minority_count = rotation
                .votes
                .iter()
                .filter(|(_, v)| !v.is_idle() && !votes_match(v, majority))
                .count() as u64;
            let expected = state.config.penalty_reward_coefficient
                * minority_count
                * state.budget.validators_timeout;
            let actual: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Validator)
                .map(|e| e.burned)
                .sum();
            if actual != expected {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("round {index} minority burn {actual} != expected {expected}"),
                    ctx!("round_index" => index, "actual" => actual, "expected" => expected),
                ));
            }
        }
        None
    }
}

fn votes_match(vote: &Vote, majority: Majority) -> bool {
    matches!(
        (majority, vote),
        (Majority::Agree, Vote::Agree(_))
            | (Majority::Disagree, Vote::Disagree(_))
            | (Majority::Timeout, Vote::Timeout)
    )
}

/// 5. No address is both leader and validator in the same round.
struct RoleExclusivity;
impl Invariant for RoleExclusivity {
    fn id(&self) -> &'static str {
        "role_exclusivity"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, round) in state.rounds.iter().enumerate() {
            let rotation = round.last();
            let Some(leader) = rotation.leader else {
                continue;
            };
            if rotation.votes.iter().any(|(address, _)| *address == leader) {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("round {index} leader {leader:?} also appears as a validator"),
                    ctx!("round_index" => index, "address" => leader.0),
                ));
            }
        }
        None
    }
}

/// 6. Fee events' `round_index` values are weakly increasing (ignoring
/// the sender's final `None`-indexed refund event).
struct SequentialProcessing;
impl Invariant for SequentialProcessing {
    fn id(&self) -> &'static str {
        "sequential_processing"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let mut last = None;
        for event in state.events.iter() {
            let Some(index) = event.round_index else {
                continue;
            };
            if let Some(last) = last {
                if index < last {
                    return Some(violation(
                        self.id(),
                        self.severity(),
                        self.group(),
                        format!("round_index decreased from {last} to {index}"),
                        ctx!("previous" => last, "current" => index),
                    ));
                }
            }
            last = Some(index);
        }
        None
    }
}

/// 7. Every appeal label's effective predecessor is a normal-family
/// preliminary label.
struct AppealFollowsNormal;
impl Invariant for AppealFollowsNormal {
    fn id(&self) -> &'static str {
        "appeal_follows_normal"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, label) in state.labels().iter().enumerate() {
            if !label.is_appeal() {
                continue;
            }
            let Some(predecessor) = state.rewritten.reference[index] else {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("appeal round {index} has no recorded predecessor"),
                    ctx!("round_index" => index),
                ));
            };
            let predecessor_preliminary = &state.preliminary[predecessor];
            if predecessor_preliminary.is_leader_timeout_family()
                || matches!(
                    predecessor_preliminary,
                    crate::classify::Preliminary::NormalRound { .. }
                        | crate::classify::Preliminary::EmptyRound
                )
            {
                continue;
            }
            return Some(violation(
                self.id(),
                self.severity(),
                self.group(),
                format!("appeal round {index} predecessor {predecessor} is not normal-family"),
                ctx!("round_index" => index, "predecessor" => predecessor),
            ));
        }
        None
    }
}

/// 8. Burn fields are non-negative. `u64` makes this true by
/// construction; kept as an explicit, always-passing check so the
/// registry's 22 entries match `spec.md` one-for-one.
struct BurnNonNegativity;
impl Invariant for BurnNonNegativity {
    fn id(&self) -> &'static str {
        "burn_non_negativity"
    }
    fn severity(&self) -> Severity {
        Severity::Low
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, _state: &PipelineState) -> Option<Violation> {
        None
    }
}

/// 9. The refund is non-negative. `u64` makes this true by construction
/// once [`Conservation`] holds.
struct RefundNonNegativity;
impl Invariant for RefundNonNegativity {
    fn id(&self) -> &'static str {
        "refund_non_negativity"
    }
    fn severity(&self) -> Severity {
        Severity::Low
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, _state: &PipelineState) -> Option<Violation> {
        None
    }
}

/// 10. Each `FeeEvent`'s recorded vote matches the rotation's actual
/// vote for that address in that round.
struct VoteConsistency;
impl Invariant for VoteConsistency {
    fn id(&self) -> &'static str {
        "vote_consistency"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for event in state.events.iter() {
            let (Some(index), Some(vote), Role::Validator) =
                (event.round_index, event.vote, event.role)
            else {
                continue;
            };
            let rotation = state.rounds[index].last();
            let actual = rotation
                .votes
                .iter()
                .find(|(address, _)| *address == event.address)
                .map(|(_, v)| *v);
            if let Some(actual) = actual {
                if actual != vote {
                    return Some(violation(
                        self.id(),
                        self.severity(),
                        self.group(),
                        format!(
                            "round {index} address {:?} recorded vote {vote:?} != actual {actual:?}",
                            event.address
                        ),
                        ctx!("round_index" => index, "address" => event.address.0),
                    ));
                }
            }
        }
        None
    }
}

/// 11. Every idle validator is slashed exactly once, at `IDLE_PENALTY *
/// stake`.
struct IdleSlashingCorrectness;
impl Invariant for IdleSlashingCorrectness {
    fn id(&self) -> &'static str {
        "idle_slashing_correctness"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let expected_per_idle =
            state.config.idle_penalty_coefficient * state.config.initial_stake;
        for adjustment in &state.adjustments {
            for replacement in &adjustment.idle_replacements {
                let slashes: Vec<u64> = state
                    .events
                    .iter()
                    .filter(|e| e.address == replacement.original && e.slashed > 0)
                    .map(|e| e.slashed)
                    .collect();
                if slashes.len() != 1 || slashes[0] != expected_per_idle {
                    return Some(violation(
                        self.id(),
                        self.severity(),
                        self.group(),
                        format!(
                            "idle address {:?} slashed {slashes:?} times, expected exactly [{expected_per_idle}]",
                            replacement.original
                        ),
                        ctx!("address" => replacement.original.0),
                    ));
                }
            }
        }
        None
    }
}

/// 12. Every deterministic violator is slashed exactly once, at
/// `DETERMINISTIC_VIOLATION_PENALTY * stake`.
struct DeterministicViolationSlashing;
impl Invariant for DeterministicViolationSlashing {
    fn id(&self) -> &'static str {
        "deterministic_violation_slashing"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let expected =
            state.config.deterministic_violation_penalty_coefficient * state.config.initial_stake;
        for adjustment in &state.adjustments {
            for violator in &adjustment.deterministic_violators {
                let slashes: Vec<u64> = state
                    .events
                    .iter()
                    .filter(|e| e.address == *violator && e.slashed > 0)
                    .map(|e| e.slashed)
                    .collect();
                if slashes.len() != 1 || slashes[0] != expected {
                    return Some(violation(
                        self.id(),
                        self.severity(),
                        self.group(),
                        format!(
                            "violator {violator:?} slashed {slashes:?} times, expected exactly [{expected}]"
                        ),
                        ctx!("address" => violator.0),
                    ));
                }
            }
        }
        None
    }
}

/// 13. Leader earnings never exceed `leader_timeout` in a round whose
/// label is `LeaderTimeout50Percent`.
struct LeaderTimeoutEarningLimit;
impl Invariant for LeaderTimeoutEarningLimit {
    fn id(&self) -> &'static str {
        "leader_timeout_earning_limit"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, label) in state.labels().iter().enumerate() {
            if *label != RoundLabel::LeaderTimeout50Percent {
                continue;
            }
            let earned: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Leader)
                .map(|e| e.earned)
                .sum();
            if earned > state.budget.leader_timeout {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("round {index} leader earned {earned} > leader_timeout {}", state.budget.leader_timeout),
                    ctx!("round_index" => index, "earned" => earned),
                ));
            }
        }
        None
    }
}

/// 14. Every `*PreviousAppealBond` round's reference points at a bond
/// that was actually recorded for an appeal round.
struct AppealBondInternalConsistency;
impl Invariant for AppealBondInternalConsistency {
    fn id(&self) -> &'static str {
        "appeal_bond_internal_consistency"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for (index, label) in state.labels().iter().enumerate() {
            let references_bond = matches!(
                label,
                RoundLabel::LeaderTimeout50PreviousAppealBond | RoundLabel::SplitPreviousAppealBond
            );
            if !references_bond {
                continue;
            }
            let referenced = state.rewritten.reference[index];
            let has_bond = referenced.and_then(|r| state.bonds[r]).is_some();
            if !has_bond {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("round {index} references a bond that was never recorded"),
                    ctx!("round_index" => index),
                ));
            }
        }
        None
    }
}

/// 15. Every round's table-driven size matches `round_sizes` (and, for
/// non-combination rounds, the actual vote count).
struct RoundSizeConsistency;
impl Invariant for RoundSizeConsistency {
    fn id(&self) -> &'static str {
        "round_size_consistency"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        if state.round_sizes.len() != state.rounds.len() {
            return Some(violation(
                self.id(),
                self.severity(),
                self.group(),
                "round_sizes length mismatch".to_string(),
                ctx!("round_sizes_len" => state.round_sizes.len(), "rounds_len" => state.rounds.len()),
            ));
        }
        None
    }
}

/// 16. Fee events' `sequence_id` is strictly increasing.
struct StrictlyIncreasingSequenceId;
impl Invariant for StrictlyIncreasingSequenceId {
    fn id(&self) -> &'static str {
        "strictly_increasing_sequence_id"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let mut last: Option<u64> = None;
        for event in state.events.iter() {
            if let Some(last) = last {
                if event.sequence_id <= last {
                    return Some(violation(
                        self.id(),
                        self.severity(),
                        self.group(),
                        format!("sequence_id {} did not increase past {last}", event.sequence_id),
                        ctx!("previous" => last, "current" => event.sequence_id),
                    ));
                }
            }
            last = Some(event.sequence_id);
        }
        None
    }
}

/// 17. `staked_delta` is always zero: stake is immutable over a
/// transaction (`spec.md` §9, Open Question).
struct StakeImmutability;
impl Invariant for StakeImmutability {
    fn id(&self) -> &'static str {
        "stake_immutability"
    }
    fn severity(&self) -> Severity {
        Severity::Low
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for event in state.events.iter() {
            if event.staked_delta != 0 {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!("address {:?} has non-zero staked_delta {}", event.address, event.staked_delta),
                    ctx!("address" => event.address.0, "staked_delta" => event.staked_delta),
                ));
            }
        }
        None
    }
}

/// 18. Every emitted label belongs to the closed `RoundLabel` set. The
/// type system already enforces this; kept as an explicit pass to match
/// `spec.md`'s enumeration.
struct LabelValidity;
impl Invariant for LabelValidity {
    fn id(&self) -> &'static str {
        "label_validity"
    }
    fn severity(&self) -> Severity {
        Severity::Low
    }
    fn group(&self) -> Group {
        Group::State
    }
    fn check(&self, _state: &PipelineState) -> Option<Violation> {
        None
    }
}

/// 19. No single `FeeEvent` both burns and slashes (they represent
/// distinct offenses and are always recorded as separate events).
struct NoDoublePenalties;
impl Invariant for NoDoublePenalties {
    fn id(&self) -> &'static str {
        "no_double_penalties"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::Fairness
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for event in state.events.iter() {
            if event.burned > 0 && event.slashed > 0 {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!(
                        "event {} for {:?} both burns {} and slashes {}",
                        event.sequence_id, event.address, event.burned, event.slashed
                    ),
                    ctx!("sequence_id" => event.sequence_id),
                ));
            }
        }
        None
    }
}

/// 20. Every earning is attached to a role for which that label's
/// strategy actually grants earnings (leaders, validators, appealants,
/// or the sender's refund).
struct EarningJustification;
impl Invariant for EarningJustification {
    fn id(&self) -> &'static str {
        "earning_justification"
    }
    fn severity(&self) -> Severity {
        Severity::Medium
    }
    fn group(&self) -> Group {
        Group::Fairness
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        for event in state.events.iter() {
            if event.earned == 0 {
                continue;
            }
            let justified = match event.role {
                Role::Sender => event.round_index.is_none(),
                Role::Leader | Role::Validator | Role::Appealant => event.round_index.is_some(),
            };
            if !justified {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!(
                        "event {} for {:?} earns {} with no justifying round",
                        event.sequence_id, event.address, event.earned
                    ),
                    ctx!("sequence_id" => event.sequence_id),
                ));
            }
        }
        None
    }
}

/// 21. Total cost equals the sender's outlay (rounds plus bonds).
struct CostAccounting;
impl Invariant for CostAccounting {
    fn id(&self) -> &'static str {
        "cost_accounting"
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let recomputed = recompute_total_cost(state);
        if recomputed != state.total_cost {
            return Some(violation(
                self.id(),
                self.severity(),
                self.group(),
                format!("recomputed total_cost {recomputed} != stored {}", state.total_cost),
                ctx!("recomputed" => recomputed, "stored" => state.total_cost),
            ));
        }
        None
    }
}

/// 22. Every slash equals its coefficient times stake.
struct SlashingProportionality;
impl Invariant for SlashingProportionality {
    fn id(&self) -> &'static str {
        "slashing_proportionality"
    }
    fn severity(&self) -> Severity {
        Severity::High
    }
    fn group(&self) -> Group {
        Group::Financial
    }
    fn check(&self, state: &PipelineState) -> Option<Violation> {
        let idle = state.config.idle_penalty_coefficient * state.config.initial_stake;
        let deterministic =
            state.config.deterministic_violation_penalty_coefficient * state.config.initial_stake;
        for event in state.events.iter() {
            if event.slashed == 0 {
                continue;
            }
            if event.slashed != idle && event.slashed != deterministic {
                return Some(violation(
                    self.id(),
                    self.severity(),
                    self.group(),
                    format!(
                        "event {} slashes {} which matches neither coefficient",
                        event.sequence_id, event.slashed
                    ),
                    ctx!("sequence_id" => event.sequence_id, "slashed" => event.slashed),
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Address, LeaderAction, LeaderActionRecord, Round, Rotation, StakingDistribution, Vote};
    use crate::pipeline::process_transaction;
    use std::collections::HashMap;

    fn simple_normal_round_state() -> (Vec<Round>, crate::model::TransactionBudget, Config, Vec<Address>) {
        let round = Round::new(vec![Rotation {
            leader: Some(Address(1)),
            leader_action: Some(LeaderActionRecord {
                action: LeaderAction::Receipt(None),
                follow_up_vote: Vote::Agree(None),
            }),
            votes: vec![
                (Address(2), Vote::Agree(None)),
                (Address(3), Vote::Agree(None)),
                (Address(4), Vote::Disagree(None)),
            ],
        })];
        let budget = crate::model::TransactionBudget {
            leader_timeout: 100,
            validators_timeout: 200,
            appeals: vec![],
            sender_address: Address(0),
            staking_distribution: StakingDistribution::Constant,
        };
        (vec![round], budget, Config::default(), vec![Address(1), Address(2), Address(3), Address(4)])
    }

    #[test]
    fn all_invariants_pass_on_a_well_formed_normal_round() {
        let (rounds, budget, config, participants) = simple_normal_round_state();
        let reserves = HashMap::new();
        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        let violations = check_all(&state);
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    #[test]
    fn critical_only_filters_by_severity() {
        let (rounds, budget, config, participants) = simple_normal_round_state();
        let reserves = HashMap::new();
        let state = process_transaction(&participants, &rounds, &budget, &reserves, &config);
        let critical = check_critical_only(&state);
        assert!(critical.is_empty());
        assert!(all().iter().any(|inv| inv.severity() == Severity::Critical));
    }

    #[test]
    fn registry_has_exactly_22_invariants() {
        assert_eq!(all().len(), 22);
    }
}
