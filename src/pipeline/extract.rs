//! Extracting a combined archive, benchmarked twice.
//!
//! The sequential pass inflates entries one after another on the calling
//! thread. The parallel pass hands each entry to the worker pool; workers
//! share one extractor and read their entry with positional reads.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::zip::{ZipExtractor, ZipFileEntry};

use super::report::EntryFailure;

/// `<dir>/<name>.zip` extracts into `<dir>/<name>`.
///
/// An archive without an extension has no distinct destination and is
/// rejected.
pub fn destination_for(archive: &Path) -> Result<PathBuf> {
    let (Some(stem), Some(_)) = (archive.file_stem(), archive.extension()) else {
        return Err(Error::InvalidInput(format!(
            "{} has no file extension to strip for the destination",
            archive.display()
        )));
    };
    Ok(archive.with_file_name(stem))
}

/// Resolve an entry name below `destination`, refusing anything that would
/// escape it.
fn entry_target(destination: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let safe = relative.components().count() > 0
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(Error::Format(format!("unsafe entry name {name:?}")));
    }
    Ok(destination.join(relative))
}

fn extract_entry<R: ReadAt>(
    extractor: &ZipExtractor<R>,
    entry: &ZipFileEntry,
    destination: &Path,
) -> Option<EntryFailure> {
    let target = match entry_target(destination, &entry.file_name) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(entry = %entry.file_name, "cannot extract: {e}");
            return Some(EntryFailure::new(&entry.file_name, e));
        }
    };

    match extractor.extract_to_file(entry, &target) {
        Ok(()) => {
            tracing::debug!(entry = %entry.file_name, "extracted");
            None
        }
        Err(e) => {
            tracing::warn!(entry = %entry.file_name, "cannot extract: {e}");
            // A file left by an earlier pass would hide the failure
            if let Err(remove) = fs::remove_file(&target)
                && remove.kind() != ErrorKind::NotFound
            {
                tracing::warn!(path = %target.display(), "cannot drop stale file: {remove}");
            }
            Some(EntryFailure::new(&entry.file_name, e))
        }
    }
}

/// File entries to extract, and the ones refused.
///
/// Directory entries are dropped, they are recreated implicitly. A name
/// that repeats an earlier entry is refused, so concurrent workers never
/// write the same file.
pub fn file_entries(entries: Vec<ZipFileEntry>) -> (Vec<ZipFileEntry>, Vec<EntryFailure>) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let files = entries
        .into_iter()
        .filter(|e| !e.is_directory)
        .filter(|e| {
            let first = seen.insert(e.file_name.clone());
            if !first {
                tracing::warn!(entry = %e.file_name, "duplicate entry name, ignoring");
                duplicates.push(EntryFailure::new(&e.file_name, "duplicate entry name"));
            }
            first
        })
        .collect();
    (files, duplicates)
}

/// Extract every entry in order on the calling thread.
pub fn extract_sequential<R: ReadAt>(
    extractor: &ZipExtractor<R>,
    entries: &[ZipFileEntry],
    destination: &Path,
) -> (Duration, Vec<EntryFailure>) {
    let start = Instant::now();
    let failures = entries
        .iter()
        .filter_map(|entry| extract_entry(extractor, entry, destination))
        .collect();
    (start.elapsed(), failures)
}

/// Extract every entry as its own unit of work on `pool`.
pub fn extract_parallel<R: ReadAt>(
    extractor: &ZipExtractor<R>,
    entries: &[ZipFileEntry],
    destination: &Path,
    pool: &ThreadPool,
) -> (Duration, Vec<EntryFailure>) {
    let start = Instant::now();
    let failures = pool.install(|| {
        entries
            .par_iter()
            .with_max_len(1)
            .filter_map(|entry| extract_entry(extractor, entry, destination))
            .collect()
    });
    (start.elapsed(), failures)
}
