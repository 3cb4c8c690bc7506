//! Contextual rewrites over the preliminary label sequence (`spec.md`
//! §4.3). A single left-to-right pass resolves every appeal's effect on
//! its neighbors; a final cleanup pass resolves any `LeaderTimeoutPending`
//! round that no appeal ever contested.

use crate::classify::{effective_predecessor, Preliminary};
use crate::majority::Majority;
use crate::model::RoundLabel;

/// The final label sequence plus the cross-round linkage distribution and
/// bond computation need: for every appeal-family round, its 0-based
/// ordinal among all appeals in the transaction and the index of the
/// round it contests; for every round whose label references a prior
/// appeal's bond (`LeaderTimeout150PreviousNormalRound`,
/// `LeaderTimeout50PreviousAppealBond`, `SplitPreviousAppealBond`) or that
/// is the `NormalRound` half of a successful-appeal combination, the
/// index of the referenced appeal round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenTransaction {
    pub labels: Vec<RoundLabel>,
    pub appeal_ordinal: Vec<Option<usize>>,
    /// For appeal rounds: the effective predecessor they contested.
    /// For rounds whose label names a referenced appeal bond or that
    /// combine a predecessor's size with an appeal's: the appeal round
    /// index being referenced.
    pub reference: Vec<Option<usize>>,
}

pub fn rewrite(preliminary: &[Preliminary]) -> RewrittenTransaction {
    let n = preliminary.len();
    let mut labels: Vec<RoundLabel> = preliminary.iter().map(initial_label).collect();
    let mut appeal_ordinal = vec![None; n];
    let mut reference = vec![None; n];
    let mut appeals_seen = 0usize;

    for index in 0..n {
        let Some(kind) = appeal_kind(&preliminary[index]) else {
            continue;
        };
        appeal_ordinal[index] = Some(appeals_seen);
        appeals_seen += 1;
        let predecessor = effective_predecessor(index, preliminary);
        reference[index] = Some(predecessor);

        match kind {
            AppealKind::Successful => {
                labels[predecessor] = RoundLabel::SkipRound;
                if matches!(preliminary[index], Preliminary::AppealLeaderTimeoutSuccessful) {
                    if let Some(next) = index.checked_add(1).filter(|&i| i < n) {
                        if matches!(preliminary[next], Preliminary::NormalRound { .. }) {
                            labels[next] = RoundLabel::LeaderTimeout150PreviousNormalRound;
                            reference[next] = Some(index);
                        }
                    }
                }
            }
            AppealKind::Unsuccessful => {
                // A failed challenge against a leader-timeout round leaves
                // that round standing on its own; it resolves the same way
                // a never-contested timeout does (see the cleanup pass
                // below), so there is nothing further to do here beyond
                // what `initial_label` already assigned it.
                if let Some(next) = index.checked_add(1).filter(|&i| i < n) {
                    match (&preliminary[index], &preliminary[next]) {
                        (
                            Preliminary::AppealLeaderTimeoutUnsuccessful,
                            Preliminary::LeaderTimeoutPending,
                        ) => {
                            labels[next] = RoundLabel::LeaderTimeout50PreviousAppealBond;
                            reference[next] = Some(index);
                        }
                        (
                            Preliminary::AppealLeaderUnsuccessful
                            | Preliminary::AppealValidatorUnsuccessful,
                            Preliminary::NormalRound {
                                majority: Majority::Undetermined,
                            },
                        ) => {
                            labels[next] = RoundLabel::SplitPreviousAppealBond;
                            reference[next] = Some(index);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    // Any LeaderTimeoutPending round no appeal ever targeted (it simply
    // runs out the transaction, or is followed by something other than an
    // appeal) resolves the same way a sole leader-timeout round does: the
    // leader gets the 50% compensation and nothing else happens.
    for (index, pre) in preliminary.iter().enumerate() {
        if matches!(pre, Preliminary::LeaderTimeoutPending) && labels[index] != RoundLabel::SkipRound
        {
            labels[index] = RoundLabel::LeaderTimeout50Percent;
        }
    }

    RewrittenTransaction {
        labels,
        appeal_ordinal,
        reference,
    }
}

fn initial_label(preliminary: &Preliminary) -> RoundLabel {
    match preliminary {
        Preliminary::NormalRound { .. } => RoundLabel::NormalRound,
        Preliminary::EmptyRound => RoundLabel::EmptyRound,
        Preliminary::LeaderTimeoutPending => RoundLabel::LeaderTimeout50Percent,
        Preliminary::LeaderTimeout50Percent => RoundLabel::LeaderTimeout50Percent,
        Preliminary::AppealLeaderSuccessful => RoundLabel::AppealLeaderSuccessful,
        Preliminary::AppealLeaderUnsuccessful => RoundLabel::AppealLeaderUnsuccessful,
        Preliminary::AppealLeaderTimeoutSuccessful => RoundLabel::AppealLeaderTimeoutSuccessful,
        Preliminary::AppealLeaderTimeoutUnsuccessful => {
            RoundLabel::AppealLeaderTimeoutUnsuccessful
        }
        Preliminary::AppealValidatorSuccessful => RoundLabel::AppealValidatorSuccessful,
        Preliminary::AppealValidatorUnsuccessful => RoundLabel::AppealValidatorUnsuccessful,
    }
}

enum AppealKind {
    Successful,
    Unsuccessful,
}

fn appeal_kind(preliminary: &Preliminary) -> Option<AppealKind> {
    match preliminary {
        Preliminary::AppealLeaderSuccessful
        | Preliminary::AppealLeaderTimeoutSuccessful
        | Preliminary::AppealValidatorSuccessful => Some(AppealKind::Successful),
        Preliminary::AppealLeaderUnsuccessful
        | Preliminary::AppealLeaderTimeoutUnsuccessful
        | Preliminary::AppealValidatorUnsuccessful => Some(AppealKind::Unsuccessful),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Preliminary::*;

    #[test]
    fn successful_leader_appeal_skips_predecessor() {
        let preliminary = [
            NormalRound {
                majority: Majority::Agree,
            },
            AppealLeaderSuccessful,
            NormalRound {
                majority: Majority::Disagree,
            },
        ];
        let out = rewrite(&preliminary);
        assert_eq!(
            out.labels,
            vec![
                RoundLabel::SkipRound,
                RoundLabel::AppealLeaderSuccessful,
                RoundLabel::NormalRound,
            ]
        );
        assert_eq!(out.appeal_ordinal, vec![None, Some(0), None]);
        assert_eq!(out.reference[1], Some(0));
    }

    #[test]
    fn unsuccessful_validator_appeal_followed_by_undetermined_splits_bond() {
        let preliminary = [
            NormalRound {
                majority: Majority::Agree,
            },
            AppealValidatorUnsuccessful,
            NormalRound {
                majority: Majority::Undetermined,
            },
        ];
        let out = rewrite(&preliminary);
        assert_eq!(
            out.labels,
            vec![
                RoundLabel::NormalRound,
                RoundLabel::AppealValidatorUnsuccessful,
                RoundLabel::SplitPreviousAppealBond,
            ]
        );
        assert_eq!(out.reference[2], Some(1));
    }

    #[test]
    fn leader_timeout_chain_unsuccessful_then_pending_splits_half_bond() {
        let preliminary = [
            LeaderTimeoutPending,
            AppealLeaderTimeoutUnsuccessful,
            LeaderTimeoutPending,
        ];
        let out = rewrite(&preliminary);
        assert_eq!(
            out.labels,
            vec![
                RoundLabel::LeaderTimeout50Percent,
                RoundLabel::AppealLeaderTimeoutUnsuccessful,
                RoundLabel::LeaderTimeout50PreviousAppealBond,
            ]
        );
        assert_eq!(out.reference[2], Some(1));
    }

    #[test]
    fn successful_leader_timeout_appeal_combines_next_normal_round() {
        let preliminary = [
            LeaderTimeoutPending,
            AppealLeaderTimeoutSuccessful,
            NormalRound {
                majority: Majority::Agree,
            },
        ];
        let out = rewrite(&preliminary);
        assert_eq!(
            out.labels,
            vec![
                RoundLabel::SkipRound,
                RoundLabel::AppealLeaderTimeoutSuccessful,
                RoundLabel::LeaderTimeout150PreviousNormalRound,
            ]
        );
        assert_eq!(out.reference[2], Some(1));
    }

    #[test]
    fn uncontested_leader_timeout_resolves_to_fifty_percent() {
        let preliminary = [
            NormalRound {
                majority: Majority::Agree,
            },
            LeaderTimeoutPending,
        ];
        let out = rewrite(&preliminary);
        assert_eq!(out.labels[1], RoundLabel::LeaderTimeout50Percent);
    }

    #[test]
    fn chained_unsuccessful_appeals_keep_each_normal_round_distinct() {
        let preliminary = [
            NormalRound {
                majority: Majority::Agree,
            },
            AppealValidatorUnsuccessful,
            NormalRound {
                majority: Majority::Agree,
            },
            AppealValidatorUnsuccessful,
            NormalRound {
                majority: Majority::Agree,
            },
        ];
        let out = rewrite(&preliminary);
        assert_eq!(
            out.labels,
            vec![
                RoundLabel::NormalRound,
                RoundLabel::AppealValidatorUnsuccessful,
                RoundLabel::NormalRound,
                RoundLabel::AppealValidatorUnsuccessful,
                RoundLabel::NormalRound,
            ]
        );
        assert_eq!(out.appeal_ordinal, vec![None, Some(0), None, Some(1), None]);
    }
}
