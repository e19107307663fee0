use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tax_core::RegimeRegistry;
use tax_core::registry::{HufSchedule, RegistryConfig};
use tax_data::{RegimeTableLoader, compare_registries};

/// Validate a slab-table CSV file and compare it with the built-in tables.
///
/// The CSV file should have the following columns:
/// - category: entity category code (e.g. individual_salaried, huf)
/// - age_band: below_60, 60_to_79, 80_plus or any
/// - residency: resident, non_resident, not_ordinarily_resident or any
/// - regime: old_regime or new_regime
/// - deductions: allowed or not_allowed
/// - min_income: lower bound of the slab
/// - max_income: upper bound of the slab (empty for unbounded)
/// - base_tax: tax owed on income exactly at min_income
/// - rate: the marginal rate as a decimal (e.g. 0.05)
#[derive(Parser, Debug)]
#[command(name = "regime-table-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing slab tables
    #[arg(short, long)]
    file: PathBuf,

    /// Compare against the built-in tables and fail on any difference
    #[arg(short, long, default_value_t = false)]
    compare: bool,

    /// HUF schedule of the built-in tables to compare against (statutory or legacy)
    #[arg(long, default_value = "statutory", value_parser = parse_huf_schedule)]
    huf_schedule: HufSchedule,

    /// List every loaded combination and its table
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_huf_schedule(s: &str) -> Result<HufSchedule, String> {
    HufSchedule::parse(s).ok_or_else(|| format!("expected 'statutory' or 'legacy', got '{s}'"))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    println!("Checking regime tables in: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = RegimeTableLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let registry = RegimeTableLoader::load(&records)
        .with_context(|| format!("Invalid regime tables in: {}", args.file.display()))?;

    println!("Loaded {} combinations.", registry.len());

    if args.verbose {
        for key in registry.keys() {
            if let Some(variant) = registry.get(&key) {
                println!(
                    "  {key} -> {} ({} brackets, deductions {})",
                    variant.name(),
                    variant.brackets().len(),
                    variant.deductions().as_str()
                );
            }
        }
    }

    if !args.compare {
        return Ok(ExitCode::SUCCESS);
    }

    let config = RegistryConfig {
        huf_schedule: args.huf_schedule,
    };
    let built_in = RegimeRegistry::with_statutory_tables(&config)
        .context("Failed to build the built-in regime tables")?;

    let differences = compare_registries(&built_in, &registry);
    if differences.is_empty() {
        println!(
            "Matches the built-in tables ({} HUF schedule).",
            config.huf_schedule.as_str()
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} differences from the built-in tables:", differences.len());
    for difference in &differences {
        println!("  {difference}");
    }

    Ok(ExitCode::FAILURE)
}
