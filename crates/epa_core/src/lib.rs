//! # epa_core - Expected Points Table Engine
//!
//! Computes the expected point value of every (down, distance, yardline)
//! state of an American-football possession, together with the value of
//! each play call available there.
//!
//! ## Features
//! - Exact or seeded Monte-Carlo expectations over empirical outcome CDFs
//! - Optimal and normative (historical play-call mix) policies
//! - Cycle breaking against a prior value table
//! - Deterministic: same inputs and seed produce the same table

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Dense table lookups index by state
#![allow(clippy::needless_range_loop)]

pub mod buckets;
pub mod cdf;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod expectation;
pub mod field;
pub mod mixer;
pub mod outcome;
pub mod resolved;
pub mod special_teams;
pub mod tables;

pub use buckets::{BucketId, YardlineBuckets};
pub use cdf::{CdfEntry, CdfTable, PlayType};
pub use config::{CdfFallback, EngineConfig, ExpectationMode, KickoffModel};
pub use engine::{solve, EngineInputs, Solution, ValueEngine};
pub use error::{EngineError, Result};
pub use field::{enumerate_states, DownDistance, GameState};
pub use mixer::{Branch, BranchValues, DecisionMixer, MixerPolicy, NormativeMixer, OptimalMixer};
pub use resolved::{ResolvedTable, RunStats, StateRow, StateValue};
pub use tables::{DecisionCounts, DecisionTable, FieldGoalTable, PriorTable, PuntSamples};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
