//! Read-only input tables consumed by the engine.

use fxhash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::field::{DownDistance, GameState, MAX_YARDLINE};

/// League field-goal make rate by yardline (index 0 = yardline 1).
/// Nothing is attempted from beyond yardline 50 in the source data.
const NFL_FIELD_GOAL_PROBABILITIES: [f64; 99] = [
    1.0, 0.9875, 1.0, 0.9919, 0.9937, 0.9929, 0.9797, 0.9818, 0.9693, 0.977, //
    0.9479, 0.983, 0.9777, 0.9459, 0.9659, 0.899, 0.92, 0.9167, 0.9347, 0.893, //
    0.9053, 0.8603, 0.7956, 0.822, 0.7885, 0.8, 0.7405, 0.7267, 0.7231, 0.6986, //
    0.7394, 0.7416, 0.7216, 0.6911, 0.6994, 0.7059, 0.6129, 0.5595, 0.6271, 0.5297, //
    0.4935, 0.4548, 0.4136, 0.3697, 0.3230, 0.2735, 0.2211, 0.1655, 0.1069, 0.0450, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Field-goal make probability by yardline
#[derive(Debug, Clone)]
pub struct FieldGoalTable {
    probabilities: Vec<f64>,
}

impl Default for FieldGoalTable {
    fn default() -> Self {
        Self::nfl()
    }
}

impl FieldGoalTable {
    pub fn nfl() -> Self {
        Self {
            probabilities: NFL_FIELD_GOAL_PROBABILITIES.to_vec(),
        }
    }

    /// Custom table; `probabilities[i]` is the make rate from yardline `i + 1`.
    pub fn from_probabilities(probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.len() != MAX_YARDLINE as usize {
            return Err(EngineError::InvalidConfig(format!(
                "field-goal table needs {} yardlines, got {}",
                MAX_YARDLINE,
                probabilities.len()
            )));
        }
        if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(EngineError::InvalidConfig(format!(
                "field-goal probability {} outside [0, 1]",
                p
            )));
        }
        Ok(Self { probabilities })
    }

    /// Make probability; zero off the field.
    pub fn make_probability(&self, yardline: u8) -> f64 {
        match yardline {
            0 => 0.0,
            yl => self.probabilities.get(yl as usize - 1).copied().unwrap_or(0.0),
        }
    }
}

/// Recorded punt outcome codes per yardline
#[derive(Debug, Clone)]
pub struct PuntSamples {
    by_yardline: Vec<Vec<i32>>,
}

impl Default for PuntSamples {
    fn default() -> Self {
        Self {
            by_yardline: vec![Vec::new(); MAX_YARDLINE as usize],
        }
    }
}

impl PuntSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the samples for `yardline`. Lists shorter than `min_samples`
    /// are too thin to average and are stored empty. Returns whether the
    /// list was kept.
    pub fn set(&mut self, yardline: u8, samples: Vec<i32>, min_samples: usize) -> Result<bool> {
        if !(1..=MAX_YARDLINE).contains(&yardline) {
            return Err(EngineError::InvalidConfig(format!(
                "punt samples for off-field yardline {}",
                yardline
            )));
        }
        let keep = samples.len() >= min_samples;
        self.by_yardline[yardline as usize - 1] = if keep { samples } else { Vec::new() };
        Ok(keep)
    }

    /// Samples at `yardline`; empty when punting from there was never observed.
    pub fn samples(&self, yardline: u8) -> &[i32] {
        match yardline {
            0 => &[],
            yl => self
                .by_yardline
                .get(yl as usize - 1)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Yardlines that have usable samples
    pub fn observed_yardlines(&self) -> usize {
        self.by_yardline.iter().filter(|s| !s.is_empty()).count()
    }
}

/// Externally computed state values from a previous run
#[derive(Debug, Clone, Default)]
pub struct PriorTable {
    values: FxHashMap<GameState, f64>,
}

impl PriorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: GameState, value: f64) {
        self.values.insert(state, value);
    }

    pub fn get(&self, state: &GameState) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// Bootstrap value of a fresh first down at `yardline`.
    pub fn first_down(&self, yardline: u8) -> Result<f64> {
        let state = GameState::first_down_at(yardline)?;
        self.get(&state)
            .ok_or(EngineError::MissingPrior { state })
    }

    /// Yardlines 1-99 lacking a first-down entry
    pub fn missing_first_downs(&self) -> Vec<u8> {
        (1..=MAX_YARDLINE)
            .filter(|yl| self.first_down(*yl).is_err())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(GameState, f64)> for PriorTable {
    fn from_iter<I: IntoIterator<Item = (GameState, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Observed play-call counts for one situation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionCounts {
    pub run: u32,
    pub pass: u32,
    pub kick: u32,
    pub punt: u32,
}

impl DecisionCounts {
    pub fn as_weights(&self) -> [f64; 4] {
        [
            self.run as f64,
            self.pass as f64,
            self.kick as f64,
            self.punt as f64,
        ]
    }

    pub fn total(&self) -> u64 {
        self.run as u64 + self.pass as u64 + self.kick as u64 + self.punt as u64
    }
}

/// Historical play-call frequencies keyed by (down-distance, yardline)
#[derive(Debug, Clone, Default)]
pub struct DecisionTable {
    counts: FxHashMap<(DownDistance, u8), DecisionCounts>,
}

impl DecisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: DownDistance, yardline: u8, counts: DecisionCounts) {
        self.counts.insert((key, yardline), counts);
    }

    /// Counts for `state`; situations never observed count as zero.
    pub fn counts(&self, state: &GameState) -> DecisionCounts {
        self.counts
            .get(&(state.down_distance(), state.yardline))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfl_field_goal_table() {
        let table = FieldGoalTable::nfl();
        assert!((table.make_probability(1) - 1.0).abs() < 1e-12);
        assert!((table.make_probability(50) - 0.045).abs() < 1e-12);
        assert_eq!(table.make_probability(51), 0.0);
        assert_eq!(table.make_probability(0), 0.0);
        assert_eq!(table.make_probability(120), 0.0);
    }

    #[test]
    fn test_custom_field_goal_table_validation() {
        assert!(FieldGoalTable::from_probabilities(vec![0.5; 99]).is_ok());
        assert!(FieldGoalTable::from_probabilities(vec![0.5; 98]).is_err());
        let mut bad = vec![0.5; 99];
        bad[3] = 1.5;
        assert!(FieldGoalTable::from_probabilities(bad).is_err());
    }

    #[test]
    fn test_thin_punt_lists_are_dropped() {
        let mut punts = PuntSamples::new();
        assert!(punts.set(60, vec![40; 12], 10).unwrap());
        assert!(!punts.set(5, vec![20; 3], 10).unwrap());
        assert_eq!(punts.samples(60).len(), 12);
        assert!(punts.samples(5).is_empty());
        assert!(punts.samples(0).is_empty());
        assert_eq!(punts.observed_yardlines(), 1);
        assert!(punts.set(100, vec![40; 12], 10).is_err());
    }

    #[test]
    fn test_prior_first_down_lookup() {
        let prior: PriorTable = [
            (GameState::new(1, 10, 50).unwrap(), 2.0),
            (GameState::new(1, 5, 5).unwrap(), 5.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(prior.first_down(50).unwrap(), 2.0);
        assert_eq!(prior.first_down(5).unwrap(), 5.0);
        assert_eq!(
            prior.first_down(40),
            Err(EngineError::MissingPrior {
                state: GameState::new(1, 10, 40).unwrap()
            })
        );
        assert_eq!(prior.missing_first_downs().len(), 97);
    }

    #[test]
    fn test_decision_counts_default_to_zero() {
        let mut table = DecisionTable::new();
        table.insert(
            DownDistance::new(4, 1),
            30,
            DecisionCounts { run: 5, pass: 3, kick: 10, punt: 0 },
        );
        let seen = table.counts(&GameState::new(4, 1, 30).unwrap());
        assert_eq!(seen.total(), 18);
        let unseen = table.counts(&GameState::new(4, 1, 31).unwrap());
        assert_eq!(unseen, DecisionCounts::default());
    }
}
