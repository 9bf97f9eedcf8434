//! Command implementations for the HOT processor CLI
//!
//! Sets up logging, turns parsed arguments into a [`DatasetProcessor`] and
//! runs it.

use crate::cli::args::{Args, CommonArgs};
use crate::models::ProcessingStats;
use crate::processor::DatasetProcessor;
use anyhow::{Context, Result};
use tracing::{debug, error, info};

/// Main command runner
pub fn run(args: Args) -> Result<ProcessingStats> {
    let kind = args.command.kind();
    let common = args.command.common();

    setup_logging(common);
    info!("Starting HOT processor for {} data", kind);
    debug!("Command line arguments: {:?}", args);

    common.validate()?;

    let output = common.output_path(kind);
    let mut processor = DatasetProcessor::new(kind, common.input.clone(), output.clone())?
        .with_config(common.to_config(kind))
        .with_files(common.files.clone())
        .quiet(common.quiet);
    if let Some(dir) = &common.summaries {
        processor = processor.with_summary_dir(dir.clone());
    }
    if let Some(path) = args.command.format_file() {
        processor = processor.with_format_file(path.clone());
    }
    if let Some(path) = &common.unmatched_report {
        processor = processor.with_unmatched_report(path.clone());
    }
    if let Some(path) = &common.comments_file {
        processor = processor.with_comments_file(path.clone());
    }

    let stats = processor
        .process()
        .inspect_err(|error| {
            if error.is_ingestion_abort() {
                error!("Aborted {} run; no output was written", kind);
            }
        })
        .with_context(|| format!("Failed to convert {} data to {}", kind, output.display()))?;

    info!(
        "Completed {}: {} files, {} rows in {}ms",
        kind, stats.files_processed, stats.rows_written, stats.processing_time_ms
    );
    Ok(stats)
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hot_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
