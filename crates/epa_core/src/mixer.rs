//! Decision Mixers
//!
//! A state's four branch values (run, pass, field goal, punt) are computed
//! once; the mixer decides how they combine into the state's value.
//!
//! - [`OptimalMixer`]: the offense always makes the best call.
//! - [`NormativeMixer`]: the offense calls plays as often as coaches
//!   historically did in that situation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::field::GameState;
use crate::tables::DecisionTable;

/// Play-call branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Run,
    Pass,
    Kick,
    Punt,
}

impl Branch {
    /// All branches in output column order
    pub const ALL: [Branch; 4] = [Branch::Run, Branch::Pass, Branch::Kick, Branch::Punt];

    pub fn index(&self) -> usize {
        match self {
            Branch::Run => 0,
            Branch::Pass => 1,
            Branch::Kick => 2,
            Branch::Punt => 3,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Run => "run",
            Branch::Pass => "pass",
            Branch::Kick => "kick",
            Branch::Punt => "punt",
        }
    }

    /// Kicking branches are only available on fourth down
    pub fn is_kick(&self) -> bool {
        matches!(self, Branch::Kick | Branch::Punt)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four branch values of one state, indexed by [`Branch::index`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchValues(pub [f64; 4]);

impl BranchValues {
    pub fn new(run: f64, pass: f64, kick: f64, punt: f64) -> Self {
        Self([run, pass, kick, punt])
    }

    pub fn get(&self, branch: Branch) -> f64 {
        self.0[branch.index()]
    }

    /// Best branch; the earliest one wins ties
    pub fn argmax(&self) -> Branch {
        let mut best = Branch::Run;
        for branch in Branch::ALL {
            if self.get(branch) > self.get(best) {
                best = branch;
            }
        }
        best
    }

    pub fn max(&self) -> f64 {
        self.get(self.argmax())
    }

    pub fn min(&self) -> f64 {
        self.0.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Strategy combining branch values into a state value
pub trait DecisionMixer {
    fn combine(&self, state: &GameState, values: &BranchValues) -> f64;
}

/// Value of the best available call
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalMixer;

impl DecisionMixer for OptimalMixer {
    fn combine(&self, _state: &GameState, values: &BranchValues) -> f64 {
        values.max()
    }
}

/// Frequency-weighted average of the calls coaches actually make
#[derive(Debug, Clone, Copy)]
pub struct NormativeMixer<'a> {
    decisions: &'a DecisionTable,
    unviable: f64,
}

impl<'a> NormativeMixer<'a> {
    pub fn new(decisions: &'a DecisionTable, unviable: f64) -> Self {
        Self {
            decisions,
            unviable,
        }
    }

    /// Weights applied at `state` after masking unavailable calls
    pub fn weights(&self, state: &GameState, values: &BranchValues) -> [f64; 4] {
        let mut weights = self.decisions.counts(state).as_weights();
        for branch in Branch::ALL {
            let masked = (branch.is_kick() && !state.is_fourth_down())
                || values.get(branch) <= self.unviable;
            if masked {
                weights[branch.index()] = 0.0;
            }
        }
        weights
    }
}

impl DecisionMixer for NormativeMixer<'_> {
    fn combine(&self, state: &GameState, values: &BranchValues) -> f64 {
        let weights = self.weights(state, values);
        let mut total: f64 = weights.iter().sum();
        if total == 0.0 {
            total = 1.0;
        }
        weights
            .iter()
            .zip(values.0.iter())
            .filter(|(w, _)| **w > 0.0)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            / total
    }
}

/// Which mixer a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixerPolicy {
    #[default]
    Optimal,
    Normative,
}

impl MixerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixerPolicy::Optimal => "optimal",
            MixerPolicy::Normative => "normative",
        }
    }
}

impl fmt::Display for MixerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MixerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimal" => Ok(MixerPolicy::Optimal),
            "normative" | "norm" => Ok(MixerPolicy::Normative),
            other => Err(format!("unknown policy '{}' (expected optimal or normative)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::DecisionCounts;
    use proptest::prelude::*;

    const UNVIABLE: f64 = -1000.0;

    fn state(down: u8, distance: u8, yardline: u8) -> GameState {
        GameState::new(down, distance, yardline).unwrap()
    }

    fn table_with(state: &GameState, counts: DecisionCounts) -> DecisionTable {
        let mut table = DecisionTable::new();
        table.insert(state.down_distance(), state.yardline, counts);
        table
    }

    #[test]
    fn test_argmax_prefers_earliest_on_ties() {
        assert_eq!(BranchValues::new(1.0, 1.0, 0.0, 0.0).argmax(), Branch::Run);
        assert_eq!(BranchValues::new(1.0, 2.0, 2.0, 0.0).argmax(), Branch::Pass);
        assert_eq!(BranchValues::new(-1.0, -2.0, 0.5, 0.6).argmax(), Branch::Punt);
    }

    #[test]
    fn test_optimal_takes_max() {
        let values = BranchValues::new(1.2, 1.8, UNVIABLE, UNVIABLE);
        assert_eq!(OptimalMixer.combine(&state(1, 10, 75), &values), 1.8);
    }

    #[test]
    fn test_normative_weights_by_frequency() {
        let s = state(4, 2, 35);
        let table = table_with(&s, DecisionCounts { run: 1, pass: 1, kick: 2, punt: 0 });
        let mixer = NormativeMixer::new(&table, UNVIABLE);
        let values = BranchValues::new(2.0, 3.0, 1.0, -0.5);
        let combined = mixer.combine(&s, &values);
        assert!((combined - (2.0 + 3.0 + 2.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_normative_ignores_kicks_before_fourth_down() {
        let s = state(3, 8, 40);
        let table = table_with(&s, DecisionCounts { run: 1, pass: 3, kick: 4, punt: 4 });
        let mixer = NormativeMixer::new(&table, UNVIABLE);
        let values = BranchValues::new(1.0, 2.0, UNVIABLE, UNVIABLE);
        assert_eq!(mixer.weights(&s, &values), [1.0, 3.0, 0.0, 0.0]);
        assert!((mixer.combine(&s, &values) - 7.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_normative_masks_unviable_field_goal() {
        let s = state(4, 5, 75);
        let table = table_with(&s, DecisionCounts { run: 0, pass: 1, kick: 3, punt: 6 });
        let mixer = NormativeMixer::new(&table, UNVIABLE);
        let values = BranchValues::new(0.0, -1.0, UNVIABLE, -0.4);
        let combined = mixer.combine(&s, &values);
        assert!((combined - (-1.0 - 0.4 * 6.0) / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_normative_unobserved_situation_is_zero() {
        let table = DecisionTable::new();
        let mixer = NormativeMixer::new(&table, UNVIABLE);
        let values = BranchValues::new(2.0, 3.0, UNVIABLE, UNVIABLE);
        assert_eq!(mixer.combine(&state(2, 7, 60), &values), 0.0);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("optimal".parse::<MixerPolicy>().unwrap(), MixerPolicy::Optimal);
        assert_eq!("Normative".parse::<MixerPolicy>().unwrap(), MixerPolicy::Normative);
        assert!("greedy".parse::<MixerPolicy>().is_err());
        assert_eq!(MixerPolicy::default(), MixerPolicy::Optimal);
    }

    #[test]
    fn test_branch_indices_round_trip() {
        for branch in Branch::ALL {
            assert_eq!(Branch::from_index(branch.index()), Some(branch));
        }
        assert_eq!(Branch::from_index(4), None);
    }

    proptest! {
        #[test]
        fn prop_normative_within_branch_bounds(
            run in -10.0f64..10.0,
            pass in -10.0f64..10.0,
            kick in -10.0f64..10.0,
            punt in -10.0f64..10.0,
            counts in prop::array::uniform4(0u32..50),
            down in 1u8..=4,
        ) {
            let s = state(down, 5, 50);
            let table = table_with(&s, DecisionCounts {
                run: counts[0],
                pass: counts[1],
                kick: counts[2],
                punt: counts[3],
            });
            let mixer = NormativeMixer::new(&table, UNVIABLE);
            let values = BranchValues::new(run, pass, kick, punt);
            let total: f64 = mixer.weights(&s, &values).iter().sum();
            prop_assume!(total > 0.0);
            let combined = mixer.combine(&s, &values);
            prop_assert!(combined >= values.min() - 1e-9);
            prop_assert!(combined <= values.max() + 1e-9);
        }

        #[test]
        fn prop_optimal_matches_argmax(
            values in prop::array::uniform4(-10.0f64..10.0),
        ) {
            let values = BranchValues(values);
            let combined = OptimalMixer.combine(&state(4, 1, 1), &values);
            prop_assert_eq!(combined, values.get(values.argmax()));
            prop_assert!(values.0.iter().all(|v| *v <= combined));
        }
    }
}
