//! Per-file compression of a directory, benchmarked twice.
//!
//! Every regular file directly inside the source directory becomes one
//! [`WorkItem`]. The batch is compressed once on the calling thread and once
//! on the worker pool; both passes write the same temp archives, and the
//! second pass's output is what the merger picks up.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{Error, Result};

use super::entry::write_single_entry;
use super::report::{EntryFailure, PARALLEL, SEQUENTIAL, TimingSample};
use super::warn_first_pass_only;

/// Extension of both the temp archives and the combined archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// One file slated for compression into its own temp archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    /// Entry name inside the archive: the source's base name.
    pub entry_name: String,
    /// `<scratch>/<entry_name>.zip`
    pub target: PathBuf,
}

/// Work items plus the files rejected while planning.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub items: Vec<WorkItem>,
    pub rejected: Vec<EntryFailure>,
}

/// Timings and failures of both strategies.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Always `[sequential, parallel]`.
    pub samples: Vec<TimingSample>,
    pub failures: Vec<EntryFailure>,
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Subdirectories are not descended into. Symlinks count when they point at
/// a regular file.
pub fn enumerate_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(path = %path.display(), "cannot stat, ignoring: {e}"),
        }
    }
    files.sort();
    Ok(files)
}

/// Turn source files into work items targeting `scratch`.
///
/// Files whose name is not valid UTF-8, or whose temp archive name would
/// clash with an earlier file's, are rejected instead of silently
/// overwriting each other. `fold_case` must be set when `scratch` lives on a
/// case-insensitive filesystem.
pub fn plan(files: Vec<PathBuf>, scratch: &Path, fold_case: bool) -> BatchPlan {
    let mut plan = BatchPlan::default();
    let mut seen = HashSet::new();

    for source in files {
        let display = source.display().to_string();
        let Some(name) = source.file_name() else {
            plan.rejected.push(EntryFailure::new(display, "not a file name"));
            continue;
        };
        let Some(entry_name) = name.to_str().map(str::to_string) else {
            plan.rejected
                .push(EntryFailure::new(display, "file name is not valid UTF-8"));
            continue;
        };

        let temp_name = format!("{entry_name}.{ARCHIVE_EXTENSION}");
        let key = if fold_case {
            temp_name.to_lowercase()
        } else {
            temp_name.clone()
        };
        if !seen.insert(key) {
            plan.rejected.push(EntryFailure::new(
                entry_name,
                format!("temp archive name {temp_name} collides with another file"),
            ));
            continue;
        }

        plan.items.push(WorkItem {
            target: scratch.join(&temp_name),
            source,
            entry_name,
        });
    }

    plan
}

/// Whether names in `dir` compare case-insensitively.
pub fn is_case_insensitive(dir: &Path) -> Result<bool> {
    let probe = dir.join(".case-probe");
    fs::write(&probe, b"")?;
    let folded = dir.join(".CASE-PROBE").exists();
    fs::remove_file(&probe)?;
    Ok(folded)
}

fn compress_item(item: &WorkItem, level: u32) -> Option<EntryFailure> {
    match write_single_entry(&item.source, &item.entry_name, &item.target, level) {
        Ok(()) => {
            tracing::debug!(entry = %item.entry_name, "compressed");
            None
        }
        Err(e) => {
            tracing::warn!("{e}");
            Some(EntryFailure::from_error(&item.entry_name, &e))
        }
    }
}

/// Strategy A: every item in order on the calling thread.
pub fn compress_sequential(items: &[WorkItem], level: u32) -> (Duration, Vec<EntryFailure>) {
    let start = Instant::now();
    let failures = items
        .iter()
        .filter_map(|item| compress_item(item, level))
        .collect();
    (start.elapsed(), failures)
}

/// Strategy B: one unit per item on `pool`, returning after the last one
/// finishes.
pub fn compress_parallel(
    items: &[WorkItem],
    pool: &ThreadPool,
    level: u32,
) -> (Duration, Vec<EntryFailure>) {
    let start = Instant::now();
    let failures = pool.install(|| {
        items
            .par_iter()
            .with_max_len(1)
            .filter_map(|item| compress_item(item, level))
            .collect()
    });
    (start.elapsed(), failures)
}

/// Run both strategies back to back and collect their timings.
///
/// A file that fails in the parallel pass has its temp archive removed, so
/// it is absent from the merge even if the sequential pass succeeded. Only
/// those files are reported as failures.
pub fn compress_batch(items: &[WorkItem], pool: &ThreadPool, level: u32) -> BatchOutcome {
    let (sequential, sequential_failures) = compress_sequential(items, level);
    tracing::info!(elapsed_ms = sequential.as_millis() as u64, "sequential pass done");

    let (parallel, parallel_failures) = compress_parallel(items, pool, level);
    tracing::info!(elapsed_ms = parallel.as_millis() as u64, "parallel pass done");

    for failure in &parallel_failures {
        if let Some(item) = items.iter().find(|i| i.entry_name == failure.name)
            && let Err(e) = fs::remove_file(&item.target)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %item.target.display(), "cannot drop stale temp archive: {e}");
        }
    }
    warn_first_pass_only(&sequential_failures, &parallel_failures);

    BatchOutcome {
        samples: vec![
            TimingSample::new(SEQUENTIAL, sequential),
            TimingSample::new(PARALLEL, parallel),
        ],
        failures: parallel_failures,
    }
}

/// Validate the source directory before anything touches the filesystem.
pub fn check_source_dir(dir: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(dir).map_err(|e| {
        Error::InvalidInput(format!("directory {} is not accessible: {e}", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(Error::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    dir.canonicalize().map_err(|e| {
        Error::InvalidInput(format!("cannot resolve {}: {e}", dir.display()))
    })
}
