//! Yardline Buckets
//!
//! Outcome distributions are binned by field position. Inside the 20 every
//! yardline is its own bucket; further out the bins widen because plays from
//! midfield are far more alike (and far sparser in the data) than plays near
//! the goal line.

use crate::error::{EngineError, Result};
use crate::field::MAX_YARDLINE;

/// Bucket labels in order. Labels double as CDF file name suffixes.
pub const BUCKET_LABELS: [&str; 29] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21-23", "24-27", "28-32", "33-38", "39-44", "45-50", "51-70", "71-85",
    "86-99",
];

/// Number of yardline buckets
pub const NUM_BUCKETS: usize = BUCKET_LABELS.len();

/// Index into [`BUCKET_LABELS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId(pub u8);

impl BucketId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn label(&self) -> &'static str {
        BUCKET_LABELS[self.index()]
    }

    /// Parse a bucket label such as "7" or "45-50"
    pub fn from_label(label: &str) -> Option<Self> {
        BUCKET_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| BucketId(i as u8))
    }

    pub fn all() -> impl Iterator<Item = BucketId> {
        (0..NUM_BUCKETS as u8).map(BucketId)
    }
}

/// Inclusive yardline range covered by a label
fn parse_range(label: &str) -> Result<(u8, u8)> {
    let invalid = || EngineError::InvalidBucket(label.to_string());
    match label.split_once('-') {
        Some((start, end)) => {
            let start = start.parse().map_err(|_| invalid())?;
            let end = end.parse().map_err(|_| invalid())?;
            Ok((start, end))
        }
        None => {
            let yl = label.parse().map_err(|_| invalid())?;
            Ok((yl, yl))
        }
    }
}

/// Yardline → bucket lookup
#[derive(Debug, Clone)]
pub struct YardlineBuckets {
    /// mapping[yardline] for yardline 1..=99; slot 0 unused
    mapping: [Option<BucketId>; MAX_YARDLINE as usize + 1],
}

impl Default for YardlineBuckets {
    fn default() -> Self {
        Self::from_labels(&BUCKET_LABELS).expect("built-in bucket labels cover 1-99")
    }
}

impl YardlineBuckets {
    /// Build the lookup from ordered labels. Every yardline 1-99 must be
    /// covered exactly once.
    pub fn from_labels(labels: &[&str]) -> Result<Self> {
        let mut mapping = [None; MAX_YARDLINE as usize + 1];
        for (index, label) in labels.iter().enumerate() {
            let (start, end) = parse_range(label)?;
            if start == 0 || end > MAX_YARDLINE || start > end {
                return Err(EngineError::InvalidBucket(label.to_string()));
            }
            for yardline in start..=end {
                let slot = &mut mapping[yardline as usize];
                if slot.is_some() {
                    return Err(EngineError::InvalidBucket(format!(
                        "{} overlaps yardline {}",
                        label, yardline
                    )));
                }
                *slot = Some(BucketId(index as u8));
            }
        }
        if let Some(gap) = (1..=MAX_YARDLINE).find(|yl| mapping[*yl as usize].is_none()) {
            return Err(EngineError::InvalidBucket(format!(
                "yardline {} is not covered",
                gap
            )));
        }
        Ok(Self { mapping })
    }

    /// Bucket for a playable yardline (1-99)
    pub fn bucket_for(&self, yardline: u8) -> Option<BucketId> {
        self.mapping.get(yardline as usize).copied().flatten()
    }
}
