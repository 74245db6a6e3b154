//! Outcome Distributions
//!
//! Per play type, per yardline bucket, per down-distance: a discrete CDF over
//! raw outcome codes (yards gained, or sentinel-encoded turnovers).

use fxhash::FxHashMap;

use crate::buckets::BucketId;
use crate::config::CdfFallback;
use crate::error::{EngineError, Result};
use crate::field::{DownDistance, GameState, FIRST_DOWN_DISTANCE};

/// Scrimmage play type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayType {
    Run,
    Pass,
}

impl PlayType {
    pub const ALL: [PlayType; 2] = [PlayType::Run, PlayType::Pass];

    /// File name prefix used by the distribution exports
    pub fn file_prefix(&self) -> &'static str {
        match self {
            PlayType::Run => "rush",
            PlayType::Pass => "pass",
        }
    }
}

/// Discrete cumulative distribution over outcome codes
#[derive(Debug, Clone, PartialEq)]
pub struct CdfEntry {
    values: Vec<i32>,
    cdf: Vec<f64>,
}

impl CdfEntry {
    /// Build a validated entry.
    ///
    /// Values must be strictly increasing, cumulative probabilities must lie in
    /// [0, 1] and never decrease, and the last one must be 1 within `tolerance`.
    /// An entry with no values is allowed and contributes nothing.
    pub fn new(values: Vec<i32>, cdf: Vec<f64>, tolerance: f64) -> Result<Self> {
        let invalid = |reason: String| EngineError::InvalidCdf {
            key: format!("{:?}", values),
            reason,
        };
        if values.len() != cdf.len() {
            return Err(invalid(format!(
                "{} values but {} cumulative probabilities",
                values.len(),
                cdf.len()
            )));
        }
        if let Some(w) = values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "values not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        let mut prev = 0.0;
        for &p in &cdf {
            if !p.is_finite() || p < prev - tolerance || p > 1.0 + tolerance {
                return Err(invalid(format!("cumulative probability {} after {}", p, prev)));
            }
            prev = p;
        }
        if let Some(&last) = cdf.last() {
            if (last - 1.0).abs() > tolerance {
                return Err(invalid(format!("final cumulative probability {} != 1", last)));
            }
        }
        Ok(Self { values, cdf })
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// (value, probability mass) pairs in ascending value order
    pub fn masses(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        let mut prev = 0.0;
        self.values.iter().zip(&self.cdf).map(move |(&v, &c)| {
            let mass = c - prev;
            prev = c;
            (v, mass)
        })
    }

    /// Inverse CDF: smallest value whose cumulative probability reaches `u`.
    pub fn quantile(&self, u: f64) -> Option<i32> {
        let idx = self.cdf.partition_point(|&c| c < u);
        self.values
            .get(idx.min(self.values.len().saturating_sub(1)))
            .copied()
    }
}

/// All distributions, keyed by (play type, bucket, down-distance)
#[derive(Debug, Clone, Default)]
pub struct CdfTable {
    entries: FxHashMap<(PlayType, BucketId, DownDistance), CdfEntry>,
}

impl CdfTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        play: PlayType,
        bucket: BucketId,
        key: DownDistance,
        entry: CdfEntry,
    ) -> Option<CdfEntry> {
        self.entries.insert((play, bucket, key), entry)
    }

    pub fn get(&self, play: PlayType, bucket: BucketId, key: DownDistance) -> Option<&CdfEntry> {
        self.entries.get(&(play, bucket, key))
    }

    /// Distribution for `state`, applying `fallback` when the exact key is missing.
    pub fn lookup(
        &self,
        play: PlayType,
        bucket: BucketId,
        state: &GameState,
        fallback: CdfFallback,
    ) -> Option<&CdfEntry> {
        let exact = self.get(play, bucket, state.down_distance());
        if exact.is_some() || fallback == CdfFallback::None {
            return exact;
        }
        (1..state.down)
            .rev()
            .find_map(|down| self.get(play, bucket, DownDistance::new(down, state.distance)))
            .or_else(|| {
                let first = DownDistance::new(1, FIRST_DOWN_DISTANCE.min(state.yardline));
                self.get(play, bucket, first)
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per (play type, bucket)
    pub fn coverage(&self) -> FxHashMap<(PlayType, BucketId), usize> {
        let mut counts = FxHashMap::default();
        for (play, bucket, _) in self.entries.keys() {
            *counts.entry((*play, *bucket)).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(values: Vec<i32>, cdf: Vec<f64>) -> CdfEntry {
        CdfEntry::new(values, cdf, 1e-6).unwrap()
    }

    #[test]
    fn test_masses_sum_to_one() {
        let e = entry(vec![0, 5, 99], vec![0.3, 0.8, 1.0]);
        let masses: Vec<(i32, f64)> = e.masses().collect();
        assert_eq!(masses.len(), 3);
        assert!((masses[0].1 - 0.3).abs() < 1e-12);
        assert!((masses[1].1 - 0.5).abs() < 1e-12);
        assert!((masses[2].1 - 0.2).abs() < 1e-12);
        let total: f64 = masses.iter().map(|(_, m)| m).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_malformed_entries() {
        assert!(CdfEntry::new(vec![0, 5], vec![1.0], 1e-6).is_err());
        assert!(CdfEntry::new(vec![5, 0], vec![0.5, 1.0], 1e-6).is_err());
        assert!(CdfEntry::new(vec![0, 0], vec![0.5, 1.0], 1e-6).is_err());
        assert!(CdfEntry::new(vec![0, 5], vec![0.6, 0.4], 1e-6).is_err());
        assert!(CdfEntry::new(vec![0, 5], vec![0.3, 0.9], 1e-6).is_err());
        assert!(CdfEntry::new(vec![0], vec![f64::NAN], 1e-6).is_err());
    }

    #[test]
    fn test_single_value_and_empty_entries() {
        let single = entry(vec![3], vec![1.0]);
        assert_eq!(single.masses().collect::<Vec<_>>(), vec![(3, 1.0)]);

        let empty = entry(vec![], vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.masses().count(), 0);
        assert_eq!(empty.quantile(0.5), None);
    }

    #[test]
    fn test_quantile() {
        let e = entry(vec![-2, 4, 10], vec![0.25, 0.75, 1.0]);
        assert_eq!(e.quantile(0.0), Some(-2));
        assert_eq!(e.quantile(0.25), Some(-2));
        assert_eq!(e.quantile(0.26), Some(4));
        assert_eq!(e.quantile(0.9), Some(10));
        assert_eq!(e.quantile(1.0), Some(10));
    }

    #[test]
    fn test_lookup_fallback() {
        let bucket = BucketId(25);
        let mut table = CdfTable::new();
        table.insert(PlayType::Run, bucket, DownDistance::new(2, 7), entry(vec![1], vec![1.0]));
        table.insert(PlayType::Run, bucket, DownDistance::new(1, 10), entry(vec![2], vec![1.0]));

        let third_and_7 = GameState::new(3, 7, 48).unwrap();
        assert!(table
            .lookup(PlayType::Run, bucket, &third_and_7, CdfFallback::None)
            .is_none());
        let found = table
            .lookup(PlayType::Run, bucket, &third_and_7, CdfFallback::EarlierDown)
            .unwrap();
        assert_eq!(found.values(), &[1]);

        let fourth_and_3 = GameState::new(4, 3, 48).unwrap();
        let found = table
            .lookup(PlayType::Run, bucket, &fourth_and_3, CdfFallback::EarlierDown)
            .unwrap();
        assert_eq!(found.values(), &[2]);
        assert!(table
            .lookup(PlayType::Pass, bucket, &fourth_and_3, CdfFallback::EarlierDown)
            .is_none());
    }

    #[test]
    fn test_coverage_counts() {
        let mut table = CdfTable::new();
        table.insert(PlayType::Run, BucketId(0), DownDistance::new(1, 1), entry(vec![1], vec![1.0]));
        table.insert(PlayType::Run, BucketId(0), DownDistance::new(2, 1), entry(vec![1], vec![1.0]));
        table.insert(PlayType::Pass, BucketId(0), DownDistance::new(1, 1), entry(vec![1], vec![1.0]));
        let coverage = table.coverage();
        assert_eq!(coverage[&(PlayType::Run, BucketId(0))], 2);
        assert_eq!(coverage[&(PlayType::Pass, BucketId(0))], 1);
        assert_eq!(table.len(), 3);
    }
}
