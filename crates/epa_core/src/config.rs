//! Engine Configuration
//!
//! All scoring constants, sentinel codes and numeric guards live here so a
//! run can be reproduced from a single serialized config.
//!
//! ## Usage
//! ```rust
//! use epa_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! let adjusted = EngineConfig::kickoff_adjusted();
//! assert!(config.validate().is_ok());
//! assert!(adjusted.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Points awarded per scoring event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringValues {
    /// Touchdown including the expected extra point (default: 6.945)
    pub touchdown: f64,
    /// Field goal (default: 3.0)
    pub field_goal: f64,
    /// Safety, conceded by the offense (default: 2.0)
    pub safety: f64,
}

impl Default for ScoringValues {
    fn default() -> Self {
        Self {
            touchdown: 6.945,
            field_goal: 3.0,
            safety: 2.0,
        }
    }
}

/// Field positions used by the exchange and special-teams models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Receiving team's yardline after a touchback (default: 80)
    pub touchback_yardline: u8,
    /// Receiving team's yardline after a kickoff (default: 70)
    pub kickoff_yardline: u8,
    /// Receiving team's yardline after a safety kick (default: 70)
    pub safety_kick_yardline: u8,
    /// Longest yardline a field goal is attempted from (default: 60)
    pub field_goal_range: u8,
    /// Yards between the line of scrimmage and the kick spot (default: 7)
    pub miss_spot_offset: u8,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            touchback_yardline: 80,
            kickoff_yardline: 70,
            safety_kick_yardline: 70,
            field_goal_range: 60,
            miss_spot_offset: 7,
        }
    }
}

/// Sentinel bands of the raw outcome encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeCodes {
    /// Codes below this are interceptions (default: -2000)
    pub interception_below: i32,
    /// Interception codes are `base + gain` (default: -2100)
    pub interception_base: i32,
    /// Codes below this (and not interceptions) are fumbles (default: -1000)
    pub fumble_below: i32,
    /// Fumble codes are `base + gain` (default: -1100)
    pub fumble_base: i32,
    /// Punt codes above this are muffs recovered by the kicking team (default: 1000)
    pub muff_above: i32,
    /// Punt codes below this are return touchdowns (default: -1000)
    pub return_touchdown_below: i32,
}

impl Default for OutcomeCodes {
    fn default() -> Self {
        Self {
            interception_below: -2000,
            interception_base: -2100,
            fumble_below: -1000,
            fumble_base: -1100,
            muff_above: 1000,
            return_touchdown_below: -1000,
        }
    }
}

/// Value of the kickoff the scoring team hands back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickoffModel {
    /// Kickoffs are worth nothing to either side (nflfastr convention)
    Neutral,
    /// Kickoff worth the receiving team's first-down prior at `kickoff_yardline`
    FromPrior,
}

/// How a branch expectation is computed from its CDF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationMode {
    /// Exact probability-weighted sum over the CDF
    Exact,
    /// Monte-Carlo estimate from `draws` inverse-CDF samples per branch
    Sampled { draws: u32, seed: u64 },
}

/// What to do when a (play type, bucket, down-distance) key has no CDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdfFallback {
    /// Missing data contributes zero expectation
    None,
    /// Retry earlier downs at the same distance, then the first-down key
    EarlierDown,
}

/// Full engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringValues,
    pub field: FieldSettings,
    pub codes: OutcomeCodes,
    pub kickoff: KickoffModel,
    pub expectation: ExpectationMode,
    pub fallback: CdfFallback,
    /// Branch value marking a play call as unavailable (default: -1000)
    pub unviable_value: f64,
    /// Run, pass and combined values beyond ±this abort the run (default: 100)
    pub divergence_limit: f64,
    /// Allowed deviation of a CDF's final cumulative probability from 1 (default: 1e-6)
    pub cdf_tolerance: f64,
    /// Punt sample lists shorter than this are treated as empty (default: 10)
    pub min_punt_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringValues::default(),
            field: FieldSettings::default(),
            codes: OutcomeCodes::default(),
            kickoff: KickoffModel::Neutral,
            expectation: ExpectationMode::Exact,
            fallback: CdfFallback::None,
            unviable_value: -1000.0,
            divergence_limit: 100.0,
            cdf_tolerance: 1e-6,
            min_punt_samples: 10,
        }
    }
}

impl EngineConfig {
    /// nflfastr-compatible values: neutral kickoffs, exact sums, no CDF
    /// fallback. The builder runs with this when no config file is given.
    pub fn nflfastr() -> Self {
        let mut cfg = Self::default();
        cfg.kickoff = KickoffModel::Neutral;
        cfg.expectation = ExpectationMode::Exact;
        cfg.fallback = CdfFallback::None;
        cfg
    }

    /// Charge scoring plays for the kickoff they give back
    pub fn kickoff_adjusted() -> Self {
        let mut cfg = Self::default();
        cfg.kickoff = KickoffModel::FromPrior;
        cfg
    }

    /// Sampled expectations instead of exact sums
    pub fn sampled(draws: u32, seed: u64) -> Self {
        let mut cfg = Self::default();
        cfg.expectation = ExpectationMode::Sampled { draws, seed };
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        let field = &self.field;
        for (name, yardline) in [
            ("touchback_yardline", field.touchback_yardline),
            ("kickoff_yardline", field.kickoff_yardline),
            ("safety_kick_yardline", field.safety_kick_yardline),
        ] {
            if !(1..=99).contains(&yardline) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be within 1-99, got {}",
                    name, yardline
                )));
            }
        }
        if field.field_goal_range > 99 {
            return Err(EngineError::InvalidConfig(format!(
                "field_goal_range must be at most 99, got {}",
                field.field_goal_range
            )));
        }
        let codes = &self.codes;
        if codes.interception_below >= codes.fumble_below {
            return Err(EngineError::InvalidConfig(
                "interception band must lie below the fumble band".to_string(),
            ));
        }
        if self.divergence_limit <= 0.0 || self.unviable_value.abs() <= self.divergence_limit {
            return Err(EngineError::InvalidConfig(format!(
                "unviable_value {} must lie outside the divergence limit {}",
                self.unviable_value, self.divergence_limit
            )));
        }
        if let ExpectationMode::Sampled { draws: 0, .. } = self.expectation {
            return Err(EngineError::InvalidConfig(
                "sampled expectation needs at least one draw".to_string(),
            ));
        }
        Ok(())
    }
}
