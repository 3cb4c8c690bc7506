//! Derived read-only views over a [`FeeEventLog`] (`spec.md` §2, "State
//! Projection"). Nothing here is cached; a caller recomputes a
//! [`Summary`] whenever it needs one.

use std::collections::BTreeMap;

use crate::model::{Address, FeeEventLog};

/// One address's cumulative position across every event it appears in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub earned: u64,
    pub cost: u64,
    pub burned: u64,
    pub slashed: u64,
    pub staked_delta: i64,
}

impl Balance {
    /// `earned − cost − burned − slashed`, the quantity invariant 2
    /// requires to stay non-negative.
    pub fn net(&self) -> i128 {
        self.earned as i128 - self.cost as i128 - self.burned as i128 - self.slashed as i128
    }
}

/// Totals across every address, used by the conservation invariants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub earned: u64,
    pub cost: u64,
    pub burned: u64,
    pub slashed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// `BTreeMap` rather than a hash map so iteration (e.g. for display
    /// or further aggregation) is deterministic (`spec.md` §9).
    pub balances: BTreeMap<Address, Balance>,
    pub totals: Totals,
}

pub fn project(log: &FeeEventLog) -> Summary {
    let mut balances: BTreeMap<Address, Balance> = BTreeMap::new();
    let mut totals = Totals::default();

    for event in log.iter() {
        let balance = balances.entry(event.address).or_default();
        balance.earned += event.earned;
        balance.cost += event.cost;
        balance.burned += event.burned;
        balance.slashed += event.slashed;
        balance.staked_delta += event.staked_delta;

        totals.earned += event.earned;
        totals.cost += event.cost;
        totals.burned += event.burned;
        totals.slashed += event.slashed;
    }

    Summary { balances, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventDraft, EventLogBuilder};
    use crate::model::Role;

    #[test]
    fn balances_accumulate_across_multiple_events_for_the_same_address() {
        let mut log = EventLogBuilder::new();
        let mut a = EventDraft::new(Address(1), Some(0), Role::Validator);
        a.earned = 200;
        log.push(a);
        let mut b = EventDraft::new(Address(1), Some(1), Role::Validator);
        b.burned = 50;
        log.push(b);
        let summary = project(&log.finish());
        let balance = summary.balances[&Address(1)];
        assert_eq!(balance.earned, 200);
        assert_eq!(balance.burned, 50);
        assert_eq!(balance.net(), 150);
    }

    #[test]
    fn totals_sum_across_all_addresses() {
        let mut log = EventLogBuilder::new();
        let mut a = EventDraft::new(Address(1), Some(0), Role::Validator);
        a.earned = 100;
        log.push(a);
        let mut b = EventDraft::new(Address(2), Some(0), Role::Validator);
        b.earned = 50;
        b.burned = 10;
        log.push(b);
        let summary = project(&log.finish());
        assert_eq!(summary.totals.earned, 150);
        assert_eq!(summary.totals.burned, 10);
    }
}
