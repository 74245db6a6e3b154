//! EPA Table Builder Library
//!
//! Input files → engine run → value-table CSV + SHA256 checksum
//! The output CSV doubles as the prior table of the next run.

pub mod loaders;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use epa_core::{
    BucketId, Branch, EngineConfig, EngineInputs, ExpectationMode, MixerPolicy, PlayType,
    Solution, StateRow,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use loaders::{
    load_cdf_dir, load_config, load_decisions_csv, load_prior_csv, load_punt_samples, LoadStats,
};

/// Stack reserved for the engine thread; continuation chains recurse deeply
pub const ENGINE_STACK_BYTES: usize = 256 * 1024 * 1024;

/// Value-table metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Mixer policy used ("optimal" / "normative")
    pub policy: String,
    /// Number of state rows written
    pub states: usize,
    /// SHA256 of the CSV file (hex)
    pub checksum: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    pub cycle_fallbacks: usize,
    /// States per chosen branch, keyed "run" / "pass" / "kick" / "punt"
    pub choices: BTreeMap<String, usize>,
    pub elapsed_ms: u64,
}

/// Paths of one run's inputs
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub prior: PathBuf,
    pub punts: PathBuf,
    pub cdf_dir: PathBuf,
    pub decisions: Option<PathBuf>,
}

/// Load every input table.
pub fn load_inputs(paths: &InputPaths, config: &EngineConfig) -> Result<EngineInputs> {
    let (priors, _) = load_prior_csv(&paths.prior)?;
    let punts = load_punt_samples(&paths.punts, config)?;
    let cdfs = load_cdf_dir(&paths.cdf_dir, config)?;
    let mut inputs = EngineInputs::new(priors, punts, cdfs);
    if let Some(path) = &paths.decisions {
        let (decisions, _) = load_decisions_csv(path)?;
        inputs = inputs.with_decisions(decisions);
    }
    Ok(inputs)
}

/// Run the engine on a dedicated thread with [`ENGINE_STACK_BYTES`] of stack.
pub fn run_engine(
    inputs: EngineInputs,
    config: EngineConfig,
    policy: MixerPolicy,
) -> Result<Solution> {
    let handle = std::thread::Builder::new()
        .name("epa-engine".to_string())
        .stack_size(ENGINE_STACK_BYTES)
        .spawn(move || epa_core::solve(&inputs, &config, policy))
        .context("Failed to spawn engine thread")?;
    let solution = handle
        .join()
        .map_err(|_| anyhow!("Engine thread panicked"))?
        .map_err(|e| {
            let context = if e.is_input_error() {
                "Input tables rejected"
            } else {
                "Engine run failed"
            };
            anyhow::Error::new(e).context(context)
        })?;
    Ok(solution)
}

/// Serialize rows as value-table CSV bytes.
pub fn table_csv_bytes(rows: &[StateRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).context("Failed to serialize state row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e))
}

/// Write rows to `path`; returns the SHA256 checksum of the written bytes.
pub fn write_table_csv(rows: &[StateRow], path: &Path) -> Result<String> {
    let bytes = table_csv_bytes(rows)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let checksum = format!("{:x}", hasher.finalize());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, &bytes)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(checksum)
}

/// What a written table looked like when read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableVerification {
    pub expected_checksum: String,
    pub actual_checksum: String,
    /// Rows that parse as state rows
    pub rows: usize,
    /// Rows that do not
    pub malformed_rows: usize,
}

impl TableVerification {
    pub fn checksum_matches(&self) -> bool {
        self.actual_checksum == self.expected_checksum
    }

    /// Checksum matches, every row parses and `expected_rows` were found
    pub fn is_valid(&self, expected_rows: usize) -> bool {
        self.checksum_matches() && self.malformed_rows == 0 && self.rows == expected_rows
    }
}

/// Re-read a written table: checksum its bytes and count its rows.
pub fn verify_table(path: &Path, expected_checksum: &str) -> Result<TableVerification> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read table file: {}", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let actual_checksum = format!("{:x}", hasher.finalize());

    let mut rows = 0;
    let mut malformed_rows = 0;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    for row in reader.deserialize::<StateRow>() {
        let parsed = match row {
            Ok(row) => row.state().map(|_| ()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(()) => rows += 1,
            Err(e) => {
                log::warn!("Malformed row in {}: {}", path.display(), e);
                malformed_rows += 1;
            }
        }
    }

    Ok(TableVerification {
        expected_checksum: expected_checksum.to_string(),
        actual_checksum,
        rows,
        malformed_rows,
    })
}

/// Full pipeline: load inputs, solve, write the table.
///
/// `sampled` switches to Monte-Carlo expectations with (draws, seed).
pub fn build_table(
    paths: &InputPaths,
    config_path: Option<&Path>,
    policy: MixerPolicy,
    sampled: Option<(u32, u64)>,
    output_csv: &Path,
) -> Result<TableMetadata> {
    let mut config = load_config(config_path)?;
    if let Some((draws, seed)) = sampled {
        config.expectation = ExpectationMode::Sampled { draws, seed };
    }
    let inputs = load_inputs(paths, &config)?;

    let started = Instant::now();
    let solution = run_engine(inputs, config, policy)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let rows = solution.table.rows();
    let checksum = write_table_csv(&rows, output_csv)?;

    Ok(TableMetadata {
        policy: policy.to_string(),
        states: rows.len(),
        checksum,
        created_at: chrono::Utc::now().to_rfc3339(),
        cycle_fallbacks: solution.stats.cycle_fallbacks,
        choices: Branch::ALL
            .iter()
            .map(|b| (b.as_str().to_string(), solution.stats.choice_count(*b)))
            .collect(),
        elapsed_ms,
    })
}

/// Coverage summary of a set of inputs
#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub cdf_entries: usize,
    /// Buckets with no entry for (run, pass)
    pub empty_buckets: Vec<(String, String)>,
    pub punt_yardlines: usize,
    pub prior_entries: usize,
    pub missing_first_downs: Vec<u8>,
    pub decision_entries: Option<usize>,
}

impl InputReport {
    /// Inputs an engine run would reject
    pub fn is_runnable(&self) -> bool {
        self.missing_first_downs.is_empty()
    }
}

/// Load inputs and summarize their coverage.
pub fn validate_inputs(paths: &InputPaths, config_path: Option<&Path>) -> Result<InputReport> {
    let config = load_config(config_path)?;
    let inputs = load_inputs(paths, &config)?;

    let coverage = inputs.cdfs.coverage();
    let mut empty_buckets = Vec::new();
    for play in PlayType::ALL {
        for bucket in BucketId::all() {
            if !coverage.contains_key(&(play, bucket)) {
                empty_buckets.push((play.file_prefix().to_string(), bucket.label().to_string()));
            }
        }
    }

    Ok(InputReport {
        cdf_entries: inputs.cdfs.len(),
        empty_buckets,
        punt_yardlines: inputs.punts.observed_yardlines(),
        prior_entries: inputs.priors.len(),
        missing_first_downs: inputs.priors.missing_first_downs(),
        decision_entries: inputs.decisions.as_ref().map(|d| d.len()),
    })
}
