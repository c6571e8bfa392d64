
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ConsensusSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    starling_version: String,

    /// Input gene call records (JSON), as produced by the tool parsers
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input-calls")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_calls: PathBuf,

    /// Nomenclature table (JSON) mapping tool allele spellings to canonical designations
    #[clap(required = true)]
    #[clap(short = 'n')]
    #[clap(long = "nomenclature")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Reference tables"))]
    pub nomenclature_fn: PathBuf,

    /// Function/phenotype table (JSON) with per-gene allele functions and diplotype rules
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "phenotypes")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Reference tables"))]
    pub phenotype_fn: PathBuf,

    /// Optional per-gene tool priority ranking (JSON); without it, conflicts fall through to majority voting
    #[clap(long = "tool-priorities")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Reference tables"))]
    pub priority_fn: Option<PathBuf>,

    /// Output folder
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Fraction of resolved votes that must be strictly exceeded for majority resolution
    #[clap(long = "majority-threshold")]
    #[clap(value_name = "FLOAT")]
    #[clap(help_heading = Some("Consensus parameters"))]
    #[clap(default_value = "0.5")]
    pub majority_threshold: f64,

    /// Number of threads to use in the resolution step
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,

    // Debug options that are generally hidden and just for quick testing
    /// Skips a number of sample-gene groups (debug only); non-0 values may create partial values in output
    #[clap(hide = true)]
    #[clap(long = "skip")]
    #[clap(default_value = "0")]
    pub skip_blocks: usize,

    /// Takes a number of sample-gene groups (debug only); non-0 values may create partial values in output
    #[clap(hide = true)]
    #[clap(long = "take")]
    #[clap(default_value = "0")]
    pub take_blocks: usize,
}

pub fn check_consensus_settings(mut settings: ConsensusSettings) -> anyhow::Result<ConsensusSettings> {
    // hard code the version in
    settings.starling_version = FULL_VERSION.clone();
    info!("Starling version: {:?}", &settings.starling_version);
    info!("Sub-command: consensus");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.input_calls, "Input calls")?;
    info!("\tInput calls: {:?}", &settings.input_calls);

    info!("Reference tables:");
    check_required_filename(&settings.nomenclature_fn, "Nomenclature table")?;
    info!("\tNomenclature: {:?}", &settings.nomenclature_fn);
    check_required_filename(&settings.phenotype_fn, "Phenotype table")?;
    info!("\tPhenotypes: {:?}", &settings.phenotype_fn);
    check_optional_filename(settings.priority_fn.as_deref(), "Tool priority table")?;
    if let Some(priority_fn) = settings.priority_fn.as_deref() {
        info!("\tTool priorities: {priority_fn:?}");
    } else {
        info!("\tTool priorities: None");
    }

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    // other misc parameters
    info!("Consensus parameters:");
    ensure!(
        (0.0..1.0).contains(&settings.majority_threshold),
        "--majority-threshold must be in [0.0, 1.0)"
    );
    info!("\tMajority threshold: {}", settings.majority_threshold);

    // 0 is just a sentinel for everything
    if settings.take_blocks == 0 {
        settings.take_blocks = usize::MAX;
    }
    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
