//! EPA Table Builder CLI
//!
//! Solves a value table from CDF, punt, prior and decision files, or
//! checks that a set of input files is complete.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use epa_builder::InputPaths;
#[cfg(feature = "cli")]
use epa_core::MixerPolicy;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "epa_builder")]
#[command(about = "Build expected-points tables for every down, distance and yardline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(clap::Args)]
struct InputArgs {
    /// Prior value table CSV (output of a previous run)
    #[arg(long)]
    prior: PathBuf,

    /// Punt samples JSON
    #[arg(long)]
    punts: PathBuf,

    /// Directory of {rush|pass}_cdf_yl{bucket}.json files
    #[arg(long)]
    cdf_dir: PathBuf,

    /// Play-call counts CSV (required by the normative policy)
    #[arg(long)]
    decisions: Option<PathBuf>,

    /// Engine config JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl InputArgs {
    fn paths(&self) -> InputPaths {
        InputPaths {
            prior: self.prior.clone(),
            punts: self.punts.clone(),
            cdf_dir: self.cdf_dir.clone(),
            decisions: self.decisions.clone(),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Solve the full value table
    Solve {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output CSV file path
        #[arg(long)]
        out: PathBuf,

        /// optimal or normative
        #[arg(long, default_value = "optimal")]
        policy: MixerPolicy,

        /// Estimate expectations from N samples per branch instead of exact sums
        #[arg(long)]
        sampled_draws: Option<u32>,

        /// Seed for sampled expectations
        #[arg(long, default_value = "25")]
        seed: u64,

        /// Verify the table after writing
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Load inputs and report their coverage
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            inputs,
            out,
            policy,
            sampled_draws,
            seed,
            verify,
            metadata,
        } => {
            println!("🔨 Solving {} value table...", policy);
            println!("   Prior:  {}", inputs.prior.display());
            println!("   CDFs:   {}", inputs.cdf_dir.display());
            println!("   Punts:  {}", inputs.punts.display());
            println!("   Output: {}", out.display());

            let sampled = sampled_draws.map(|draws| (draws, seed));
            let meta = epa_builder::build_table(
                &inputs.paths(),
                inputs.config.as_deref(),
                policy,
                sampled,
                &out,
            )?;

            print_metadata(&meta);

            if verify {
                verify_table_integrity(&out, &meta)?;
            }

            if let Some(metadata_path) = metadata {
                save_metadata(&metadata_path, &meta)?;
            }
        }

        Commands::Validate { inputs } => {
            println!("🔍 Validating inputs...");
            let report = epa_builder::validate_inputs(&inputs.paths(), inputs.config.as_deref())?;

            println!("   CDF entries:        {}", report.cdf_entries);
            println!("   Empty CDF files:    {}", report.empty_buckets.len());
            for (play, bucket) in &report.empty_buckets {
                println!("     - {}_cdf_yl{}.json", play, bucket);
            }
            println!("   Punt yardlines:     {}", report.punt_yardlines);
            println!("   Prior entries:      {}", report.prior_entries);
            if let Some(count) = report.decision_entries {
                println!("   Decision entries:   {}", count);
            }

            if report.is_runnable() {
                println!("\n✅ Inputs are complete");
            } else {
                anyhow::bail!(
                    "❌ Prior table lacks first downs at yardlines {:?}",
                    report.missing_first_downs
                )
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_metadata(meta: &epa_builder::TableMetadata) {
    println!("\n✅ Table built successfully!");
    println!("   Policy:          {}", meta.policy);
    println!("   States:          {}", meta.states);
    println!("   Cycle fallbacks: {}", meta.cycle_fallbacks);
    for (branch, count) in &meta.choices {
        println!("   Chose {:<5}      {}", branch, count);
    }
    println!("   Elapsed:         {} ms", meta.elapsed_ms);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

/// Re-read the written table and compare it with what the run reported.
#[cfg(feature = "cli")]
fn verify_table_integrity(path: &std::path::Path, meta: &epa_builder::TableMetadata) -> Result<()> {
    println!("\n🔍 Re-reading {}...", path.display());
    let check = epa_builder::verify_table(path, &meta.checksum)?;
    println!("   Rows:      {} of {}", check.rows, meta.states);

    if check.is_valid(meta.states) {
        println!("✅ Table matches checksum {}", check.actual_checksum);
        return Ok(());
    }
    anyhow::bail!(
        "❌ Table on disk differs from the run: {} rows ({} malformed) where {} were written, checksum {} where {} was expected",
        check.rows,
        check.malformed_rows,
        meta.states,
        check.actual_checksum,
        check.expected_checksum
    )
}

#[cfg(feature = "cli")]
fn save_metadata(path: &std::path::Path, meta: &epa_builder::TableMetadata) -> Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create metadata directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(meta).context("Failed to serialize table metadata")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write metadata: {}", path.display()))?;
    println!("\n📄 {} states, {} cycle fallbacks recorded in {}", meta.states, meta.cycle_fallbacks, path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("epa_builder was compiled without its command line; rebuild with `--features cli` to solve or validate tables.");
    std::process::exit(2);
}
