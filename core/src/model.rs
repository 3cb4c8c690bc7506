//! Value types for the fee-distribution protocol: votes, rounds, budgets,
//! and the append-only fee-event log.
//!
//! Nothing in this module performs I/O or owns mutable shared state; every
//! type here is constructed once by the caller and never mutated in place
//! (see `spec.md` §3, "Lifecycle").

use serde::{Deserialize, Serialize};

/// An opaque participant identifier.
///
/// Identity is opaque; the `Ord` impl exists only to break ties
/// deterministically where the protocol calls for it (see `spec.md` §3).
/// Actual address derivation is the caller's concern, not the core's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

/// An opaque digest of a leader's submitted content, used only to detect
/// deterministic-violation mismatches (`spec.md` §4.5). The core never
/// computes this hash itself; it is supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub u64);

/// A single validator's vote for one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Agree(Option<ContentHash>),
    Disagree(Option<ContentHash>),
    Timeout,
    Idle,
    /// Used in leader-appeal rounds, where no content vote is taken.
    NotApplicable,
}

impl Vote {
    pub fn content_hash(&self) -> Option<ContentHash> {
        match self {
            Vote::Agree(h) | Vote::Disagree(h) => *h,
            Vote::Timeout | Vote::Idle | Vote::NotApplicable => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Vote::Idle)
    }
}

/// What the leader submitted for a rotation, paired with the leader's own
/// vote on that submission (`spec.md` §3: "a leader action is a pair
/// `(Receipt | LeaderTimeout, follow_up_vote)`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderAction {
    Receipt(Option<ContentHash>),
    LeaderTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderActionRecord {
    pub action: LeaderAction,
    pub follow_up_vote: Vote,
}

/// A mapping from address to vote for a single election attempt.
///
/// Earlier rotations within a `Round` represent re-elections; only the
/// round's last rotation determines its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    pub leader: Option<Address>,
    pub leader_action: Option<LeaderActionRecord>,
    /// Validator votes, in the order the caller supplied them. Order is
    /// significant: iteration over participants must follow this order to
    /// stay deterministic (`spec.md` §9).
    pub votes: Vec<(Address, Vote)>,
}

impl Rotation {
    pub fn vote_values(&self) -> impl Iterator<Item = Vote> + '_ {
        self.votes.iter().map(|(_, v)| *v)
    }
}

/// An ordered, non-empty sequence of rotations for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub rotations: Vec<Rotation>,
}

impl Round {
    pub fn new(rotations: Vec<Rotation>) -> Self {
        assert!(
            !rotations.is_empty(),
            "a Round must contain at least one rotation"
        );
        Round { rotations }
    }

    pub fn last(&self) -> &Rotation {
        self.rotations
            .last()
            .expect("Round invariant: at least one rotation")
    }
}

/// Which distribution among participants backs each address's stake.
///
/// Only `Constant` is implemented; other distributions are reserved for
/// future protocol versions (`spec.md` §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingDistribution {
    Constant,
}

/// Binds an appeal round (by the order it appears in the transaction) to
/// the address that posted the appeal bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealRecord {
    pub appealant_address: Address,
}

/// Sender-provided configuration for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBudget {
    pub leader_timeout: u64,
    pub validators_timeout: u64,
    /// One entry per appeal round in the transaction, in the order those
    /// appeal rounds occur.
    pub appeals: Vec<AppealRecord>,
    pub sender_address: Address,
    pub staking_distribution: StakingDistribution,
}

/// Which capacity a [`FeeEvent`] was earned, paid, or slashed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Leader,
    Validator,
    Appealant,
    Sender,
}

/// The closed set of semantic round classifications, after contextual
/// rewriting (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundLabel {
    NormalRound,
    SkipRound,
    EmptyRound,
    AppealLeaderSuccessful,
    AppealLeaderUnsuccessful,
    AppealValidatorSuccessful,
    AppealValidatorUnsuccessful,
    AppealLeaderTimeoutSuccessful,
    AppealLeaderTimeoutUnsuccessful,
    LeaderTimeout50Percent,
    LeaderTimeout150PreviousNormalRound,
    LeaderTimeout50PreviousAppealBond,
    SplitPreviousAppealBond,
}

impl RoundLabel {
    /// Whether this label belongs to the appeal family (used, e.g., by
    /// invariant 7 and the bond/refund computations).
    pub fn is_appeal(&self) -> bool {
        matches!(
            self,
            RoundLabel::AppealLeaderSuccessful
                | RoundLabel::AppealLeaderUnsuccessful
                | RoundLabel::AppealValidatorSuccessful
                | RoundLabel::AppealValidatorUnsuccessful
                | RoundLabel::AppealLeaderTimeoutSuccessful
                | RoundLabel::AppealLeaderTimeoutUnsuccessful
        )
    }

    pub fn is_successful_appeal(&self) -> bool {
        matches!(
            self,
            RoundLabel::AppealLeaderSuccessful
                | RoundLabel::AppealValidatorSuccessful
                | RoundLabel::AppealLeaderTimeoutSuccessful
        )
    }
}

/// An immutable, append-only accounting record for one participant in one
/// round (or a sender refund, which has no associated round).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    pub sequence_id: u64,
    pub address: Address,
    pub round_index: Option<usize>,
    pub round_label: Option<RoundLabel>,
    pub role: Role,
    pub vote: Option<Vote>,
    pub earned: u64,
    pub cost: u64,
    pub burned: u64,
    pub slashed: u64,
    pub staked_delta: i64,
}

/// The append-only log produced by one run of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEventLog {
    pub events: Vec<FeeEvent>,
}

impl FeeEventLog {
    pub fn iter(&self) -> impl Iterator<Item = &FeeEvent> {
        self.events.iter()
    }
}
