//! Append-only fee-event emission with a strictly increasing
//! `sequence_id` (`spec.md` §7.1).

use crate::model::{Address, FeeEvent, FeeEventLog, Role, RoundLabel, Vote};

/// Accumulates [`FeeEvent`]s in emission order, stamping each with the
/// next `sequence_id`. Distribution strategies hold one of these for the
/// lifetime of a single transaction; nothing about it is reused across
/// transactions.
#[derive(Debug, Default)]
pub struct EventLogBuilder {
    next_sequence_id: u64,
    events: Vec<FeeEvent>,
}

/// The fields a distribution strategy fills in for one participant's
/// outcome in one round; `sequence_id` is assigned by the builder.
#[derive(Debug, Clone, Copy)]
pub struct EventDraft {
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

impl EventDraft {
    /// A zeroed draft for `address` in the given round/role; callers set
    /// only the fields relevant to the outcome being recorded.
    pub fn new(address: Address, round_index: Option<usize>, role: Role) -> Self {
        EventDraft {
            address,
            round_index,
            round_label: None,
            role,
            vote: None,
            earned: 0,
            cost: 0,
            burned: 0,
            slashed: 0,
            staked_delta: 0,
        }
    }
}

impl EventLogBuilder {
    pub fn new() -> Self {
        EventLogBuilder::default()
    }

    pub fn push(&mut self, draft: EventDraft) {
        let event = FeeEvent {
            sequence_id: self.next_sequence_id,
            address: draft.address,
            round_index: draft.round_index,
            round_label: draft.round_label,
            role: draft.role,
            vote: draft.vote,
            earned: draft.earned,
            cost: draft.cost,
            burned: draft.burned,
            slashed: draft.slashed,
            staked_delta: draft.staked_delta,
        };
        self.next_sequence_id += 1;
        self.events.push(event);
    }

    pub fn finish(self) -> FeeEventLog {
        FeeEventLog {
            events: self.events,
        }
    }

    /// Sum of every `earned` and `burned` field pushed so far, needed by
    /// the refund calculation before the sender's own event is appended.
    pub fn earned_and_burned(&self) -> u64 {
        self.events.iter().map(|e| e.earned + e.burned).sum()
    }
}
