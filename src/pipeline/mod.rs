//! Compression and extraction benchmarks.
//!
//! ## Compression
//!
//! 1. Validate the source directory and snapshot its regular files
//! 2. Create a scratch directory inside it, owned by this run
//! 3. Compress every file into its own temp archive, sequentially and then
//!    on the worker pool ([`batch`])
//! 4. Copy the temp archives' entries into `<dir>.zip` ([`merge`])
//! 5. Remove the scratch directory, whatever happened in step 4
//!
//! ## Extraction
//!
//! The archive `<dir>.zip` is extracted into `<dir>` twice, once per
//! strategy ([`extract`]).
//!
//! Both operations are plain blocking functions that take explicit
//! [`Options`]; nothing is shared between runs.

pub mod batch;
pub mod entry;
pub mod extract;
pub mod merge;
pub mod pool;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::LocalFileReader;
use crate::zip::{DEFAULT_LEVEL, ZipExtractor};

use batch::ARCHIVE_EXTENSION;
pub use report::{
    CompressionReport, DecompressionReport, EntryFailure, PARALLEL, SEQUENTIAL, TimingSample,
};
use report::merge_failures;

/// Prefix of the per-run scratch directory created inside the source.
pub const SCRATCH_PREFIX: &str = ".zipbench-scratch-";

/// Tuning shared by compression and extraction.
#[derive(Debug, Clone)]
pub struct Options {
    /// Worker pool size; zero means available parallelism.
    pub workers: usize,
    /// DEFLATE level, 0 to 9.
    pub level: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workers: 0,
            level: DEFAULT_LEVEL,
        }
    }
}

/// Failures of the first pass that the second pass recovered from. They do
/// not count as skipped, since the output holds the file.
pub(crate) fn warn_first_pass_only(first: &[EntryFailure], second: &[EntryFailure]) {
    for failure in first {
        if !second.iter().any(|f| f.name == failure.name) {
            tracing::warn!(
                entry = %failure.name,
                "failed in the sequential pass only: {}",
                failure.reason
            );
        }
    }
}

/// `<parent>/<dir>` is archived to `<parent>/<dir>.zip`.
pub fn archive_path_for(source_dir: &Path) -> Result<PathBuf> {
    let name = source_dir.file_name().ok_or_else(|| {
        Error::InvalidInput(format!("{} has no directory name", source_dir.display()))
    })?;
    let mut file_name = name.to_os_string();
    file_name.push(".");
    file_name.push(ARCHIVE_EXTENSION);
    Ok(source_dir.with_file_name(file_name))
}

/// Compress every top-level file of `source_dir` into `<source_dir>.zip`,
/// timing the sequential and the parallel strategy.
pub fn compress_directory(source_dir: &Path, options: &Options) -> Result<CompressionReport> {
    let source_dir = batch::check_source_dir(source_dir)?;
    let archive_path = archive_path_for(&source_dir)?;

    let files = batch::enumerate_files(&source_dir).map_err(|e| {
        Error::InvalidInput(format!("cannot list {}: {e}", source_dir.display()))
    })?;
    let file_count = files.len();
    tracing::info!(dir = %source_dir.display(), files = file_count, "compressing");

    let pool = pool::build_pool(options.workers)?;
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(&source_dir)
        .map_err(|source| Error::Resource {
            path: source_dir.join(SCRATCH_PREFIX),
            source,
        })?;

    let fold_case = batch::is_case_insensitive(scratch.path()).unwrap_or_else(|e| {
        tracing::warn!("cannot probe filesystem case sensitivity: {e}");
        true
    });
    let plan = batch::plan(files, scratch.path(), fold_case);
    let mut failures = plan.rejected;
    for failure in &failures {
        tracing::warn!(entry = %failure.name, "skipped: {}", failure.reason);
    }

    let outcome = batch::compress_batch(&plan.items, &pool, options.level);
    merge_failures(&mut failures, outcome.failures);

    let merged = merge::merge_archives(scratch.path(), &archive_path);

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!(path = %scratch_path.display(), "cannot remove scratch directory: {e}");
    }
    let entries = merged?;

    Ok(CompressionReport {
        source_dir,
        archive_path,
        samples: outcome.samples,
        files: file_count,
        entries,
        failures,
    })
}

/// Extract `archive` into the directory named after it, timing a sequential
/// and a parallel pass.
pub fn decompress_archive(archive: &Path, options: &Options) -> Result<DecompressionReport> {
    let destination = extract::destination_for(archive)?;

    let reader = LocalFileReader::new(archive).map_err(|e| Error::extraction(archive, e))?;
    let extractor = ZipExtractor::new(Arc::new(reader));
    let listed = extractor
        .list_files()
        .map_err(|e| Error::extraction(archive, e))?;
    let (entries, duplicates) = extract::file_entries(listed);
    let entry_count = entries.len() + duplicates.len();
    tracing::info!(archive = %archive.display(), entries = entry_count, "extracting");

    fs::create_dir_all(&destination).map_err(|source| Error::Resource {
        path: destination.clone(),
        source,
    })?;
    let pool = pool::build_pool(options.workers)?;

    let (sequential, sequential_failures) =
        extract::extract_sequential(&extractor, &entries, &destination);
    tracing::info!(elapsed_ms = sequential.as_millis() as u64, "sequential pass done");

    let (parallel, parallel_failures) =
        extract::extract_parallel(&extractor, &entries, &destination, &pool);
    tracing::info!(elapsed_ms = parallel.as_millis() as u64, "parallel pass done");
    warn_first_pass_only(&sequential_failures, &parallel_failures);

    // The destination holds what the parallel pass wrote
    let mut failures = duplicates;
    merge_failures(&mut failures, parallel_failures);

    Ok(DecompressionReport {
        archive_path: archive.to_path_buf(),
        destination,
        samples: vec![
            TimingSample::new(SEQUENTIAL, sequential),
            TimingSample::new(PARALLEL, parallel),
        ],
        entries: entry_count,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_sits_next_to_the_directory() {
        assert_eq!(
            archive_path_for(Path::new("/home/me/photos")).unwrap(),
            PathBuf::from("/home/me/photos.zip")
        );
        assert!(archive_path_for(Path::new("/")).is_err());
    }

    #[test]
    fn missing_archive_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decompress_archive(&dir.path().join("absent.zip"), &Options::default())
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(!dir.path().join("absent").exists());
    }

    #[test]
    fn archive_without_extension_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data");
        fs::write(&archive, b"whatever").unwrap();
        assert!(matches!(
            decompress_archive(&archive, &Options::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("junk.zip");
        fs::write(&archive, b"PK but not really").unwrap();
        assert!(matches!(
            decompress_archive(&archive, &Options::default()),
            Err(Error::Extraction { .. })
        ));
    }
}
