//! Protocol constants and the `Config` record threaded through the
//! pipeline. No environment variables, no files, no global state — a
//! caller builds a `Config` (usually via `Config::default()`) and passes
//! it by reference through every call (`spec.md` §6.4, §9).

use serde::{Deserialize, Serialize};

/// Dimensionless coefficients, multiplied by a validator's stake to get a
/// concrete penalty or reward amount. Part of the protocol spec, not
/// runtime-tunable (`spec.md` §4.5).
pub const PENALTY_REWARD_COEFFICIENT: u64 = 1;
pub const IDLE_PENALTY_COEFFICIENT: u64 = 10;
pub const DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT: u64 = 100;

/// Committee sizes for `NormalRound`-family rounds, indexed by the count
/// of normal-family rounds seen so far in the transaction. Saturates at
/// the last entry beyond table length (`spec.md` §4.4).
pub const NORMAL_ROUND_SIZES: [u64; 9] = [5, 11, 23, 47, 95, 191, 383, 767, 1000];

/// Committee sizes for appeal rounds, indexed by the count of appeals
/// seen so far.
pub const APPEAL_ROUND_SIZES: [u64; 9] = [7, 13, 25, 49, 97, 193, 385, 769, 1000];

pub fn normal_round_size(ordinal: usize) -> u64 {
    NORMAL_ROUND_SIZES[ordinal.min(NORMAL_ROUND_SIZES.len() - 1)]
}

pub fn appeal_round_size(ordinal: usize) -> u64 {
    APPEAL_ROUND_SIZES[ordinal.min(APPEAL_ROUND_SIZES.len() - 1)]
}

/// Protocol-wide knobs threaded through every pipeline call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub penalty_reward_coefficient: u64,
    pub idle_penalty_coefficient: u64,
    pub deterministic_violation_penalty_coefficient: u64,
    /// The stake every participant starts the transaction with, used
    /// under `StakingDistribution::Constant` (`spec.md` §3).
    pub initial_stake: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            penalty_reward_coefficient: PENALTY_REWARD_COEFFICIENT,
            idle_penalty_coefficient: IDLE_PENALTY_COEFFICIENT,
            deterministic_violation_penalty_coefficient:
                DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT,
            initial_stake: 1_000,
        }
    }
}
