
use indicatif::{ParallelProgressIterator, ProgressIterator};
use log::{LevelFilter, debug, error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::time::Instant;

use starling::cli::consensus::{ConsensusSettings, check_consensus_settings};
use starling::cli::core::{Commands, get_cli};
use starling::consensus_solver::{solve_consensus_group, ConsensusConfigBuilder};
use starling::data_types::consensus_call::ConsensusCall;
use starling::data_types::reference_db::ReferenceTables;
use starling::data_types::sample_group::SampleGeneGroup;
use starling::parsing::call_loader::load_gene_calls;
use starling::parsing::group_generation::generate_sample_gene_groups;
use starling::util::json_io::save_json;
use starling::util::progress_bar::get_progress_style;
use starling::writers::consensus_writer::ConsensusWriter;
use starling::writers::summary::ConsensusSummaryWriter;

fn run_consensus(settings: ConsensusSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_consensus_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // create a debug folder if specified, files might get created in sub-routines
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // load the reference tables; these are immutable for the rest of the run
    info!("Pre-loading reference tables into memory...");
    let reference_tables = match ReferenceTables::from_files(
        &settings.nomenclature_fn, &settings.phenotype_fn, settings.priority_fn.as_deref()
    ) {
        Ok(rt) => rt,
        Err(e) => {
            error!("Error while loading reference tables: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    // load and validate the input calls
    info!("Loading gene calls...");
    let loaded_calls = match load_gene_calls(&settings.input_calls) {
        Ok(lc) => lc,
        Err(e) => {
            error!("Error while loading gene calls: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let (gene_calls, excluded_records) = loaded_calls.into_parts();
    info!("Loaded {} gene calls, {} excluded by validation.", gene_calls.len(), excluded_records.len());

    // excluded records always get reported, even when there are none
    let excluded_fn = settings.output_folder.join("excluded_records.json");
    info!("Saving excluded records to {excluded_fn:?}...");
    if let Err(e) = save_json(&excluded_records, &excluded_fn) {
        error!("Error while saving excluded records: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    // check if we're in debug mode
    let skip_count = settings.skip_blocks;
    let take_count = settings.take_blocks;
    let debug_run: bool = if skip_count != 0 || take_count != usize::MAX {
        warn!("Debug run detected, output will not cover the full input.");
        warn!("Groups to skip: {skip_count}");
        warn!("Groups to process: {take_count}");
        true
    } else {
        false
    };

    // build the sample-gene groups that serve as our sub-problems
    info!("Generating sample-gene groups...");
    let all_groups: Vec<SampleGeneGroup> = match generate_sample_gene_groups(gene_calls) {
        Ok(groups) => groups,
        Err(e) => {
            error!("Error while generating sample-gene groups: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };
    let processing_groups: Vec<SampleGeneGroup> = all_groups.into_iter()
        .skip(skip_count)
        .take(take_count)
        .collect();
    info!("Group generation complete, {} group(s) to resolve.", processing_groups.len());

    if debug_run {
        warn!("Skip/take is enabled, output may be truncated.");
    }

    // the aggregation contract is one output per (sample, gene) pair being processed
    let expected_keys: BTreeSet<(String, String)> = processing_groups.iter()
        .map(|g| (g.sample_id().to_string(), g.gene().to_string()))
        .collect();

    // build our consensus configuration
    let consensus_config = match ConsensusConfigBuilder::default()
        .majority_threshold(settings.majority_threshold)
        .build() {
        Ok(cc) => cc,
        Err(e) => {
            error!("Error while building consensus config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // run the parallel iterator to solve them
    let style = get_progress_style();
    info!("Resolving consensus calls...");
    let mut all_results: Vec<(u64, ConsensusCall)> = processing_groups.into_par_iter()
        .map(|group| {
            debug!("group = {group:?}");
            let result = solve_consensus_group(&group, &reference_tables, consensus_config);
            debug!("Result = {result:?}");
            (group.group_id(), result)
        })
        .progress_with_style(style)
        .collect();

    // sort them by group ID
    all_results.sort_by_key(|(group_id, _result)| *group_id);
    info!("Group resolution complete, saving all outputs...");

    // now aggregate everything with the exactly-once guarantees
    let mut consensus_writer = ConsensusWriter::new(expected_keys);
    let mut summary_writer = ConsensusSummaryWriter::default();
    let mut resolved_groups = 0;
    let mut partial_groups = 0;
    let mut unresolved_groups = 0;
    let style = get_progress_style();
    for (_group_id, result) in all_results.into_iter().progress_with_style(style) {
        match result.consensus().simplify() {
            "resolved" => resolved_groups += 1,
            "partial" => partial_groups += 1,
            _ => unresolved_groups += 1
        };
        summary_writer.add_consensus_call(&result);
        if let Err(e) = consensus_writer.add_consensus(result) {
            error!("Error while collecting consensus results: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
    info!("Resolved:partial:unresolved groups: {resolved_groups} : {partial_groups} : {unresolved_groups}");

    // now write things
    let consensus_fn = settings.output_folder.join("consensus_calls.json");
    info!("Saving consensus calls to {consensus_fn:?}...");
    if let Err(e) = consensus_writer.finalize(&consensus_fn) {
        error!("Error while saving consensus calls: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    let summary_fn = settings.output_folder.join("summary.tsv");
    info!("Saving output summary to {summary_fn:?}...");
    if let Err(e) = summary_writer.write_summary(&summary_fn) {
        error!("Error while saving summary file: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Consensus completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Consensus(settings) => {
            run_consensus(*settings);
        }
    }

    info!("Process finished successfully.");
}
