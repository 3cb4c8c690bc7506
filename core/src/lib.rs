//! A deterministic simulator for a blockchain consensus fee-distribution
//! protocol: given a ground-truth record of how each round of a
//! transaction unfolded, computes who earns, who pays, who is slashed,
//! and how much the sender is refunded, then checks the result against a
//! registry of conservation and fairness invariants.
//!
//! The crate is a pure pipeline (`spec.md` §2): no I/O, no async, no
//! recoverable errors. Invalid inputs are excluded by the type system
//! (closed vote and label enumerations); anything else that could go
//! wrong is a programmer error and aborts via `assert!`.

pub mod adjust;
pub mod bond;
pub mod classify;
pub mod config;
pub mod distribute;
pub mod events;
pub mod invariants;
pub mod label;
pub mod majority;
pub mod model;
pub mod pipeline;
pub mod project;
pub mod refund;
pub mod rewrite;

pub use config::Config;
pub use invariants::{check_all, check_critical_only, check_group, Group, Severity, Violation};
pub use label::{trace, LabelTrace};
pub use model::{
    Address, AppealRecord, ContentHash, FeeEvent, FeeEventLog, LeaderAction, LeaderActionRecord,
    Role, Rotation, Round, RoundLabel, StakingDistribution, TransactionBudget, Vote,
};
pub use pipeline::{process_transaction, PipelineState};
pub use project::{project, Balance, Summary, Totals};
