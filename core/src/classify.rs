//! Per-round content inspection that assigns a preliminary label
//! (`spec.md` §4.2). The preliminary label set is a superset of
//! [`crate::model::RoundLabel`]: it additionally carries the information
//! the rewriter needs (a round's majority outcome, an appeal's
//! success/failure, and whether an appeal contests a normal round or a
//! leader-timeout round) and one transient variant, `LeaderTimeoutPending`,
//! that never survives rewriting unchanged.

use crate::majority::{tally, Majority};
use crate::model::{LeaderAction, Round, Rotation, Vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preliminary {
    NormalRound { majority: Majority },
    EmptyRound,
    /// A `LeaderTimeout` round that has not yet been resolved by a
    /// following appeal; resolved during rewriting into
    /// `LeaderTimeout50Percent` if never contested.
    LeaderTimeoutPending,
    LeaderTimeout50Percent,
    AppealLeaderSuccessful,
    AppealLeaderUnsuccessful,
    AppealLeaderTimeoutSuccessful,
    AppealLeaderTimeoutUnsuccessful,
    AppealValidatorSuccessful,
    AppealValidatorUnsuccessful,
}

impl Preliminary {
    /// The "normal-family" rounds are every round that is not itself an
    /// appeal: `NormalRound`, `EmptyRound`, and leader-timeout rounds
    /// (pending or already resolved to the sole-round label). Appeal
    /// "effective predecessor" lookups walk backward past appeal rounds
    /// until they find one of these (`spec.md` glossary, "effective
    /// predecessor").
    fn is_appeal_family(&self) -> bool {
        matches!(
            self,
            Preliminary::AppealLeaderSuccessful
                | Preliminary::AppealLeaderUnsuccessful
                | Preliminary::AppealLeaderTimeoutSuccessful
                | Preliminary::AppealLeaderTimeoutUnsuccessful
                | Preliminary::AppealValidatorSuccessful
                | Preliminary::AppealValidatorUnsuccessful
        )
    }

    pub fn is_leader_timeout_family(&self) -> bool {
        matches!(
            self,
            Preliminary::LeaderTimeoutPending | Preliminary::LeaderTimeout50Percent
        )
    }
}

/// Classifies every round in sequence, resolving appeal success/failure as
/// it goes (the classifier needs to know, for each appeal round, what its
/// effective predecessor looked like — `spec.md` §4.2 second paragraph).
pub fn classify_sequence(rounds: &[Round]) -> Vec<Preliminary> {
    let mut out = Vec::with_capacity(rounds.len());
    for (index, round) in rounds.iter().enumerate() {
        let is_sole_round = rounds.len() == 1;
        let preliminary = classify_round(round, index, is_sole_round, &out);
        out.push(preliminary);
    }
    out
}

fn classify_round(
    round: &Round,
    index: usize,
    is_sole_round: bool,
    previous: &[Preliminary],
) -> Preliminary {
    let rotation = round.last();

    // Rule 1: all votes NotApplicable -> Leader Appeal.
    if !rotation.votes.is_empty()
        && rotation
            .votes
            .iter()
            .all(|(_, vote)| matches!(vote, Vote::NotApplicable))
    {
        return classify_leader_appeal(round, index, previous);
    }

    // Rule 2: no leader action, at least one Agree/Disagree -> Validator Appeal.
    if rotation.leader_action.is_none()
        && rotation.votes.iter().any(|(_, vote)| {
            matches!(
                vote,
                Vote::Agree(_) | Vote::Disagree(_)
            )
        })
    {
        return classify_validator_appeal(rotation, index, previous);
    }

    // Rule 3: leader action is LeaderTimeout.
    if let Some(action) = &rotation.leader_action {
        if action.action == LeaderAction::LeaderTimeout {
            return if is_sole_round {
                Preliminary::LeaderTimeout50Percent
            } else {
                Preliminary::LeaderTimeoutPending
            };
        }
        // Rule 4: leader action is Receipt.
        if matches!(action.action, LeaderAction::Receipt(_)) {
            let majority = tally(rotation.votes.iter().map(|(_, v)| v));
            return Preliminary::NormalRound { majority };
        }
    }

    // Rule 5: no votes at all.
    Preliminary::EmptyRound
}

/// A leader-appeal round's last rotation carries no content vote (rule 1);
/// success is instead decided by whether any *earlier* rotation in the
/// same round (a re-election attempt) recorded a validator voting
/// `Disagree` against the incumbent leader (`spec.md` §4.2: "at least one
/// validator votes against the prior leader").
fn classify_leader_appeal(round: &Round, index: usize, previous: &[Preliminary]) -> Preliminary {
    let contested = round.rotations.iter().any(|rotation| {
        rotation
            .votes
            .iter()
            .any(|(_, vote)| matches!(vote, Vote::Disagree(_)))
    });
    let predecessor = effective_predecessor(index, previous);
    let targets_timeout = previous
        .get(predecessor)
        .map(|p| p.is_leader_timeout_family())
        .unwrap_or(false);
    match (targets_timeout, contested) {
        (true, true) => Preliminary::AppealLeaderTimeoutSuccessful,
        (true, false) => Preliminary::AppealLeaderTimeoutUnsuccessful,
        (false, true) => Preliminary::AppealLeaderSuccessful,
        (false, false) => Preliminary::AppealLeaderUnsuccessful,
    }
}

/// A validator-appeal round's success is decided by comparing the last
/// rotation's own majority against the effective predecessor's majority
/// (`spec.md` §4.2: "contradicts the outcome of the previous non-appeal
/// normal round").
fn classify_validator_appeal(
    rotation: &Rotation,
    index: usize,
    previous: &[Preliminary],
) -> Preliminary {
    let this_majority = tally(rotation.votes.iter().map(|(_, v)| v));
    let predecessor = effective_predecessor(index, previous);
    let predecessor_majority = match previous.get(predecessor) {
        Some(Preliminary::NormalRound { majority }) => *majority,
        _ => Majority::Undetermined,
    };
    if this_majority != predecessor_majority {
        Preliminary::AppealValidatorSuccessful
    } else {
        Preliminary::AppealValidatorUnsuccessful
    }
}

/// Walks backward from `index - 1`, skipping appeal-family rounds, and
/// returns the index of the nearest non-appeal round.
pub fn effective_predecessor(index: usize, labels: &[Preliminary]) -> usize {
    assert!(index > 0, "an appeal round cannot be the first round");
    let mut cursor = index - 1;
    loop {
        if !labels[cursor].is_appeal_family() {
            return cursor;
        }
        assert!(cursor > 0, "no non-appeal predecessor found before index 0");
        cursor -= 1;
    }
}
