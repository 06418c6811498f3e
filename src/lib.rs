//! # zipbench
//!
//! Compress a directory into a ZIP archive and extract it again, timing a
//! sequential and a parallel strategy for each direction.
//!
//! Compression deflates every top-level file of the directory into its own
//! single-entry archive, once on the calling thread and once on a worker
//! pool, then merges those archives into `<dir>.zip` by copying the
//! compressed entries verbatim. Extraction inflates `<dir>.zip` into `<dir>`,
//! again once per strategy, the parallel pass decompressing entries
//! concurrently.
//!
//! ## Features
//!
//! - Standard ZIP output with DEFLATE entries, readable by common tools
//! - Per-file failures are skipped and counted instead of aborting the batch
//! - Results appended to CSV sheets keyed by run
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipbench::{CsvMetrics, MetricsSink, Options, compress_directory, decompress_archive};
//!
//! fn main() -> anyhow::Result<()> {
//!     let options = Options::default();
//!     let mut metrics = CsvMetrics::new(".");
//!
//!     let report = compress_directory(Path::new("photos"), &options)?;
//!     metrics.record_compression(&report)?;
//!     print!("{report}");
//!
//!     let report = decompress_archive(&report.archive_path, &options)?;
//!     metrics.record_decompression(&report)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use metrics::{CsvMetrics, MetricsSink};
pub use pipeline::{
    CompressionReport, DecompressionReport, Options, compress_directory, decompress_archive,
};
pub use zip::{ZipExtractor, ZipFileEntry, ZipParser, ZipWriter};
