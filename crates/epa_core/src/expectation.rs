//! CDF Expectation Evaluator
//!
//! Expected point value of one play-call branch under its outcome CDF.
//! `value_of` classifies a raw code in the requesting state and may recurse
//! into the engine.

use rand::Rng;

use crate::cdf::CdfEntry;
use crate::error::Result;

/// Exact expectation: Σ (cdf_i − cdf_{i−1}) × value_of(value_i), ascending.
/// Empty entries contribute zero.
pub fn exact<F>(entry: &CdfEntry, mut value_of: F) -> Result<f64>
where
    F: FnMut(i32) -> Result<f64>,
{
    let mut expected = 0.0;
    for (code, mass) in entry.masses() {
        expected += mass * value_of(code)?;
    }
    Ok(expected)
}

/// Draw `draws` outcome codes by inverse-CDF sampling.
pub fn draw<R: Rng + ?Sized>(entry: &CdfEntry, draws: u32, rng: &mut R) -> Vec<i32> {
    if entry.is_empty() {
        return Vec::new();
    }
    (0..draws)
        .filter_map(|_| entry.quantile(rng.gen::<f64>()))
        .collect()
}

/// Sample mean of `value_of` over previously drawn codes; zero when none.
pub fn sampled_mean<F>(codes: &[i32], mut value_of: F) -> Result<f64>
where
    F: FnMut(i32) -> Result<f64>,
{
    if codes.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for &code in codes {
        total += value_of(code)?;
    }
    Ok(total / codes.len() as f64)
}
