//! Results tables handed to the metrics sink.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Label of the single-threaded strategy.
pub const SEQUENTIAL: &str = "sequential";
/// Label of the worker-pool strategy.
pub const PARALLEL: &str = "parallel";

/// Elapsed wall-clock time of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingSample {
    pub strategy: &'static str,
    pub elapsed_ms: u64,
}

impl TimingSample {
    pub fn new(strategy: &'static str, elapsed: Duration) -> Self {
        Self {
            strategy,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A file that was skipped because compressing or extracting it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub name: String,
    pub reason: String,
}

impl EntryFailure {
    pub fn new(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Record a per-entry error, unwrapping the `EntryWrite` layer so the
    /// reason does not repeat the name.
    pub fn from_error(name: impl Into<String>, error: &Error) -> Self {
        match error {
            Error::EntryWrite { source, .. } => Self::new(name, source),
            other => Self::new(name, other),
        }
    }
}

/// Append `more` to `failures`, keeping only the first failure per name.
///
/// Both passes of a benchmark touch the same files; a file that fails in
/// both still counts as one skipped file.
pub(crate) fn merge_failures(failures: &mut Vec<EntryFailure>, more: Vec<EntryFailure>) {
    for failure in more {
        if !failures.iter().any(|f| f.name == failure.name) {
            failures.push(failure);
        }
    }
}

/// Outcome of `compress`.
///
/// `samples` always holds exactly two rows, sequential first.
#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub source_dir: PathBuf,
    pub archive_path: PathBuf,
    pub samples: Vec<TimingSample>,
    /// Regular files found in the source directory.
    pub files: usize,
    /// Entries in the combined archive.
    pub entries: usize,
    pub failures: Vec<EntryFailure>,
}

impl CompressionReport {
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of `decompress`.
#[derive(Debug, Clone)]
pub struct DecompressionReport {
    pub archive_path: PathBuf,
    pub destination: PathBuf,
    pub samples: Vec<TimingSample>,
    /// File entries in the archive.
    pub entries: usize,
    pub failures: Vec<EntryFailure>,
}

impl DecompressionReport {
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    /// Elapsed milliseconds of the given strategy, if it ran.
    pub fn elapsed_ms(&self, strategy: &str) -> Option<u64> {
        self.samples
            .iter()
            .find(|s| s.strategy == strategy)
            .map(|s| s.elapsed_ms)
    }
}

fn write_samples(f: &mut fmt::Formatter<'_>, samples: &[TimingSample]) -> fmt::Result {
    writeln!(f, "{:<12}  {:>10}", "Strategy", "Time (ms)")?;
    writeln!(f, "{}", "-".repeat(24))?;
    for sample in samples {
        writeln!(f, "{:<12}  {:>10}", sample.strategy, sample.elapsed_ms)?;
    }
    Ok(())
}

fn write_failures(f: &mut fmt::Formatter<'_>, failures: &[EntryFailure]) -> fmt::Result {
    for failure in failures {
        writeln!(f, "  skipped: {} ({})", failure.name, failure.reason)?;
    }
    Ok(())
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Archive: {}", self.archive_path.display())?;
        write_samples(f, &self.samples)?;
        writeln!(
            f,
            "{} of {} files archived, {} skipped",
            self.entries,
            self.files,
            self.skipped()
        )?;
        write_failures(f, &self.failures)
    }
}

impl fmt::Display for DecompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Archive: {}", self.archive_path.display())?;
        writeln!(f, "Destination: {}", self.destination.display())?;
        write_samples(f, &self.samples)?;
        writeln!(
            f,
            "{} entries extracted, {} skipped",
            self.entries.saturating_sub(self.skipped()),
            self.skipped()
        )?;
        write_failures(f, &self.failures)
    }
}
