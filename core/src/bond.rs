//! Committee-size (bond) computation (`spec.md` §4.4).
//!
//! Every round draws its committee size from one of two tables, indexed by
//! a running counter that advances once per round *in its original
//! preliminary family* — appeal rounds advance the appeal counter, every
//! other preliminary kind advances the normal counter — regardless of how
//! the rewriter later relabels that round. A successful leader-timeout
//! appeal then folds its predecessor's skipped size into the following
//! normal round via the explicit combination formula below, rather than
//! by continuing the table.

use crate::classify::Preliminary;
use crate::config::{appeal_round_size, normal_round_size};
use crate::model::RoundLabel;
use crate::rewrite::RewrittenTransaction;

/// The table-driven size for every round, after the combination-round
/// override has been applied.
pub fn compute_sizes(preliminary: &[Preliminary], rewritten: &RewrittenTransaction) -> Vec<u64> {
    let mut sizes = base_sizes(preliminary);

    for (index, label) in rewritten.labels.iter().enumerate() {
        if *label != RoundLabel::LeaderTimeout150PreviousNormalRound {
            continue;
        }
        let appeal_index = rewritten.reference[index]
            .expect("LeaderTimeout150PreviousNormalRound always references its appeal round");
        let predecessor_index = rewritten.reference[appeal_index]
            .expect("an appeal round always references its effective predecessor");
        let prev_normal = sizes[predecessor_index];
        let appeal_size = sizes[appeal_index];
        sizes[index] = prev_normal + appeal_size - 1;
    }

    sizes
}

/// Table lookups in original preliminary order, before any combination
/// override.
fn base_sizes(preliminary: &[Preliminary]) -> Vec<u64> {
    let mut normal_idx = 0usize;
    let mut appeal_idx = 0usize;
    preliminary
        .iter()
        .map(|p| {
            if is_appeal_family(p) {
                let size = appeal_round_size(appeal_idx);
                appeal_idx += 1;
                size
            } else {
                let size = normal_round_size(normal_idx);
                normal_idx += 1;
                size
            }
        })
        .collect()
}

fn is_appeal_family(preliminary: &Preliminary) -> bool {
    matches!(
        preliminary,
        Preliminary::AppealLeaderSuccessful
            | Preliminary::AppealLeaderUnsuccessful
            | Preliminary::AppealLeaderTimeoutSuccessful
            | Preliminary::AppealLeaderTimeoutUnsuccessful
            | Preliminary::AppealValidatorSuccessful
            | Preliminary::AppealValidatorUnsuccessful
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::majority::Majority;
    use crate::rewrite::rewrite;

    #[test]
    fn normal_and_appeal_counters_advance_independently() {
        let preliminary = [
            Preliminary::NormalRound {
                majority: Majority::Agree,
            },
            Preliminary::AppealValidatorUnsuccessful,
            Preliminary::NormalRound {
                majority: Majority::Agree,
            },
        ];
        let sizes = base_sizes(&preliminary);
        assert_eq!(sizes, vec![5, 7, 11]);
    }

    #[test]
    fn combination_round_uses_explicit_formula_not_table_continuation() {
        let preliminary = [
            Preliminary::LeaderTimeoutPending,
            Preliminary::AppealLeaderTimeoutSuccessful,
            Preliminary::NormalRound {
                majority: Majority::Agree,
            },
        ];
        let rewritten = rewrite(&preliminary);
        let sizes = compute_sizes(&preliminary, &rewritten);
        // predecessor (index 0) normal_idx=0 -> 5, appeal (index 1) appeal_idx=0 -> 7
        assert_eq!(sizes[2], 5 + 7 - 1);
    }

    #[test]
    fn uncontested_rounds_keep_their_table_size() {
        let preliminary = [Preliminary::NormalRound {
            majority: Majority::Agree,
        }];
        let rewritten = rewrite(&preliminary);
        let sizes = compute_sizes(&preliminary, &rewritten);
        assert_eq!(sizes[0], 5);
    }
}
