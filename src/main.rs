//! Main entry point for the zipbench CLI application.
//!
//! Runs one compression or extraction benchmark, prints its results table
//! and appends it to the CSV sheets.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zipbench::cli::Command;
use zipbench::{Cli, CsvMetrics, MetricsSink, compress_directory, decompress_archive};

/// Application entry point.
///
/// The benchmark itself is blocking work; it runs on tokio's blocking pool
/// and its join handle is the only completion signal the entry point waits
/// for.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let options = cli.options();
    let mut metrics = (!cli.no_metrics).then(|| CsvMetrics::new(&cli.metrics_dir));

    match cli.command {
        Command::Compress { directory } => {
            let report = tokio::task::spawn_blocking(move || compress_directory(&directory, &options))
                .await
                .context("compression task panicked")?
                .context("compression failed")?;

            print!("{report}");
            if let Some(sink) = metrics.as_mut()
                && let Err(e) = sink.record_compression(&report)
            {
                tracing::warn!("cannot save compression results: {e}");
            }
        }
        Command::Decompress { archive } => {
            let report = tokio::task::spawn_blocking(move || decompress_archive(&archive, &options))
                .await
                .context("decompression task panicked")?
                .context("decompression failed")?;

            print!("{report}");
            if let Some(sink) = metrics.as_mut()
                && let Err(e) = sink.record_decompression(&report)
            {
                tracing::warn!("cannot save decompression results: {e}");
            }
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` overrides `-v`/`-q`.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
