//! A derived, read-only view pairing each round's preliminary
//! classification with its final rewritten label and the rewrite rule
//! that moved between them, if any. Purely diagnostic: nothing in
//! [`PipelineState`] depends on this module, and it does not feed back
//! into the pipeline.

use crate::classify::Preliminary;
use crate::model::RoundLabel;
use crate::pipeline::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelTrace {
    pub round_index: usize,
    pub preliminary: Preliminary,
    pub rewritten: RoundLabel,
    /// `None` when the rewriter left the preliminary label as-is.
    pub rule: Option<&'static str>,
    /// The round index this one's label was derived from, for the
    /// `*PreviousAppealBond` and combination-round labels.
    pub references: Option<usize>,
}

/// Builds one [`LabelTrace`] per round in `state`, in round order.
pub fn trace(state: &PipelineState) -> Vec<LabelTrace> {
    state
        .preliminary
        .iter()
        .enumerate()
        .map(|(index, preliminary)| {
            let rewritten = state.rewritten.labels[index];
            let references = state.rewritten.reference[index];
            LabelTrace {
                round_index: index,
                preliminary: *preliminary,
                rewritten,
                rule: rewrite_rule_name(preliminary, rewritten),
                references,
            }
        })
        .collect()
}

/// Names the rewrite rule that produced `rewritten` from `preliminary`,
/// mirroring the rule table in `crate::rewrite`. Returns `None` when the
/// round's label survived unchanged.
fn rewrite_rule_name(preliminary: &Preliminary, rewritten: RoundLabel) -> Option<&'static str> {
    match (preliminary, rewritten) {
        (Preliminary::NormalRound { .. }, RoundLabel::SkipRound) => {
            Some("successful_appeal_skips_effective_predecessor")
        }
        (Preliminary::LeaderTimeoutPending, RoundLabel::LeaderTimeout50Percent) => {
            Some("uncontested_leader_timeout_resolves_to_fifty_percent")
        }
        (Preliminary::NormalRound { .. }, RoundLabel::LeaderTimeout150PreviousNormalRound) => {
            Some("successful_leader_timeout_appeal_combines_next_normal_round")
        }
        (Preliminary::NormalRound { .. }, RoundLabel::SplitPreviousAppealBond) => {
            Some("unsuccessful_appeal_followed_by_undetermined_round_splits_bond")
        }
        (Preliminary::NormalRound { .. }, RoundLabel::LeaderTimeout50PreviousAppealBond) => {
            Some("unsuccessful_appeal_followed_by_leader_timeout_splits_half_bond")
        }
        _ => None,
    }
}
