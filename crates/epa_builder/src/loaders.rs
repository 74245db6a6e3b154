//! Input Table Loaders
//!
//! File formats:
//! - CDF directory: `{rush|pass}_cdf_yl{bucket}.json`, one file per play
//!   type and yardline bucket, each an object keyed by `"down-distance"`.
//!   `values`/`cdf` may be arrays or, for one-point distributions, scalars.
//! - Punt samples: JSON object `"yardline" → [code, ...]`
//! - Prior table: value-table CSV (`Down,Distance,Yardline,...,EP,...`)
//! - Decision counts: CSV `down,ydstogo,yardline,run,pass,kick,punt`
//! - Engine config: JSON, missing fields default

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use epa_core::{
    BucketId, CdfEntry, CdfTable, DecisionCounts, DecisionTable, DownDistance, EngineConfig,
    GameState, PlayType, PriorTable, PuntSamples,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Row-level loading statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadStats {
    pub total_rows: u32,
    pub loaded: u32,
    pub skipped: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCdf {
    values: OneOrMany<i32>,
    cdf: OneOrMany<f64>,
}

/// CDF file name for a play type and bucket
pub fn cdf_file_name(play: PlayType, bucket: BucketId) -> String {
    format!("{}_cdf_yl{}.json", play.file_prefix(), bucket.label())
}

/// Parse one CDF file's contents into `table`; returns the number of keys.
pub fn parse_cdf_json(
    json: &str,
    play: PlayType,
    bucket: BucketId,
    tolerance: f64,
    table: &mut CdfTable,
) -> Result<usize> {
    let raw: FxHashMap<String, RawCdf> =
        serde_json::from_str(json).context("Failed to parse CDF JSON")?;
    let count = raw.len();
    for (key, entry) in raw {
        let down_distance: DownDistance = key
            .parse()
            .with_context(|| format!("Invalid CDF key '{}'", key))?;
        let entry = CdfEntry::new(entry.values.into_vec(), entry.cdf.into_vec(), tolerance)
            .with_context(|| format!("Invalid CDF for {} in bucket {}", key, bucket.label()))?;
        table.insert(play, bucket, down_distance, entry);
    }
    Ok(count)
}

/// Load every `{rush|pass}_cdf_yl{bucket}.json` file from `dir`.
pub fn load_cdf_dir(dir: &Path, config: &EngineConfig) -> Result<CdfTable> {
    let mut table = CdfTable::new();
    for play in PlayType::ALL {
        for bucket in BucketId::all() {
            let path = dir.join(cdf_file_name(play, bucket));
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read CDF file: {}", path.display()))?;
            let keys = parse_cdf_json(&json, play, bucket, config.cdf_tolerance, &mut table)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            log::debug!("Loaded {} keys from {}", keys, path.display());
        }
    }
    log::info!("Loaded {} CDF entries from {}", table.len(), dir.display());
    Ok(table)
}

/// Load punt samples; lists shorter than `config.min_punt_samples` are dropped.
pub fn load_punt_samples(path: &Path, config: &EngineConfig) -> Result<PuntSamples> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read punt file: {}", path.display()))?;
    let raw: FxHashMap<String, Vec<i32>> =
        serde_json::from_str(&json).context("Failed to parse punt JSON")?;

    let mut punts = PuntSamples::new();
    let mut dropped = 0;
    for (key, samples) in raw {
        let yardline: i64 = key
            .trim()
            .parse()
            .with_context(|| format!("Invalid punt yardline '{}'", key))?;
        if !(1..=99).contains(&yardline) {
            log::warn!("Ignoring punt samples for off-field yardline {}", yardline);
            continue;
        }
        let count = samples.len();
        if !punts.set(yardline as u8, samples, config.min_punt_samples)? {
            dropped += 1;
            log::warn!(
                "Dropping punt samples at yardline {}: {} < {} samples",
                yardline,
                count,
                config.min_punt_samples
            );
        }
    }
    log::info!(
        "Loaded punt samples for {} yardlines ({} too thin)",
        punts.observed_yardlines(),
        dropped
    );
    Ok(punts)
}

#[derive(Debug, Deserialize)]
struct PriorRow {
    #[serde(rename = "Down")]
    down: u8,
    #[serde(rename = "Distance")]
    distance: u8,
    #[serde(rename = "Yardline")]
    yardline: u8,
    #[serde(rename = "EP")]
    ep: f64,
}

/// Load a prior table from a value-table CSV. Only `EP` is read.
pub fn load_prior_csv(path: &Path) -> Result<(PriorTable, LoadStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open prior CSV: {}", path.display()))?;

    let mut prior = PriorTable::new();
    let mut stats = LoadStats::default();
    for (line, row) in reader.deserialize::<PriorRow>().enumerate() {
        stats.total_rows += 1;
        let row = row.with_context(|| format!("Invalid prior row at line {}", line + 2))?;
        match GameState::new(row.down, row.distance, row.yardline) {
            Ok(state) => {
                prior.insert(state, row.ep);
                stats.loaded += 1;
            }
            Err(e) => {
                stats.skipped += 1;
                log::warn!("Skipping prior row at line {}: {}", line + 2, e);
            }
        }
    }
    log::info!("Loaded {} prior values from {}", stats.loaded, path.display());
    Ok((prior, stats))
}

#[derive(Debug, Deserialize)]
struct DecisionRow {
    down: u8,
    ydstogo: u8,
    yardline: u8,
    run: u32,
    pass: u32,
    kick: u32,
    punt: u32,
}

/// Load play-call counts.
pub fn load_decisions_csv(path: &Path) -> Result<(DecisionTable, LoadStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open decision CSV: {}", path.display()))?;

    let mut table = DecisionTable::new();
    let mut stats = LoadStats::default();
    for (line, row) in reader.deserialize::<DecisionRow>().enumerate() {
        stats.total_rows += 1;
        let row = row.with_context(|| format!("Invalid decision row at line {}", line + 2))?;
        if !(1..=4).contains(&row.down) || row.ydstogo == 0 || !(1..=99).contains(&row.yardline)
        {
            stats.skipped += 1;
            log::warn!(
                "Skipping decision row at line {}: {}-{} at {}",
                line + 2,
                row.down,
                row.ydstogo,
                row.yardline
            );
            continue;
        }
        table.insert(
            DownDistance::new(row.down, row.ydstogo),
            row.yardline,
            DecisionCounts {
                run: row.run,
                pass: row.pass,
                kick: row.kick,
                punt: row.punt,
            },
        );
        stats.loaded += 1;
    }
    log::info!("Loaded {} decision rows from {}", stats.loaded, path.display());
    Ok((table, stats))
}

/// Load and validate an engine config; `None` gives the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::nflfastr(),
    };
    if let Err(e) = config.validate() {
        bail!("Invalid engine config: {}", e);
    }
    Ok(config)
}
