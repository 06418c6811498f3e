//! Persisting benchmark results.
//!
//! A [`MetricsSink`] is the last stop of a run: it gets the finished report
//! and nothing flows back. [`CsvMetrics`] appends rows to two CSV sheets,
//! one for compression and one for decompression, each row tagged with the
//! run it belongs to.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{CompressionReport, DecompressionReport, PARALLEL, SEQUENTIAL};

/// Sheet receiving two rows per compression run.
pub const COMPRESSION_SHEET: &str = "compression_results.csv";
/// Sheet receiving one row per decompression run.
pub const DECOMPRESSION_SHEET: &str = "decompression_results.csv";

/// Destination for finished benchmark reports.
pub trait MetricsSink {
    fn record_compression(&mut self, report: &CompressionReport) -> Result<()>;

    fn record_decompression(&mut self, report: &DecompressionReport) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct CompressionRow<'a> {
    run_id: &'a str,
    source_dir: String,
    strategy: &'a str,
    elapsed_ms: u64,
    files: usize,
    skipped: usize,
}

#[derive(Debug, Serialize)]
struct DecompressionRow<'a> {
    run_id: &'a str,
    archive: String,
    destination: String,
    sequential_ms: Option<u64>,
    parallel_ms: Option<u64>,
    entries: usize,
    skipped: usize,
}

/// Append-only CSV sheets in a directory.
#[derive(Debug, Clone)]
pub struct CsvMetrics {
    dir: PathBuf,
}

impl CsvMetrics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn compression_sheet(&self) -> PathBuf {
        self.dir.join(COMPRESSION_SHEET)
    }

    pub fn decompression_sheet(&self) -> PathBuf {
        self.dir.join(DECOMPRESSION_SHEET)
    }

    fn append<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for row in rows {
            writer.serialize(row).map_err(std::io::Error::other)?;
        }
        writer.flush()?;

        tracing::debug!(sheet = %path.display(), rows = rows.len(), "metrics recorded");
        Ok(())
    }
}

fn run_id() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl MetricsSink for CsvMetrics {
    fn record_compression(&mut self, report: &CompressionReport) -> Result<()> {
        let run_id = run_id();
        let rows: Vec<_> = report
            .samples
            .iter()
            .map(|sample| CompressionRow {
                run_id: &run_id,
                source_dir: report.source_dir.display().to_string(),
                strategy: sample.strategy,
                elapsed_ms: sample.elapsed_ms,
                files: report.files,
                skipped: report.skipped(),
            })
            .collect();
        self.append(&self.compression_sheet(), &rows)
    }

    fn record_decompression(&mut self, report: &DecompressionReport) -> Result<()> {
        let run_id = run_id();
        let row = DecompressionRow {
            run_id: &run_id,
            archive: report.archive_path.display().to_string(),
            destination: report.destination.display().to_string(),
            sequential_ms: report.elapsed_ms(SEQUENTIAL),
            parallel_ms: report.elapsed_ms(PARALLEL),
            entries: report.entries,
            skipped: report.skipped(),
        };
        self.append(&self.decompression_sheet(), &[row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TimingSample;
    use std::time::Duration;

    fn compression_report() -> CompressionReport {
        CompressionReport {
            source_dir: PathBuf::from("/data/in"),
            archive_path: PathBuf::from("/data/in.zip"),
            samples: vec![
                TimingSample::new(SEQUENTIAL, Duration::from_millis(40)),
                TimingSample::new(PARALLEL, Duration::from_millis(15)),
            ],
            files: 3,
            entries: 3,
            failures: Vec::new(),
        }
    }

    #[test]
    fn compression_rows_append_under_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvMetrics::new(dir.path());

        sink.record_compression(&compression_report()).unwrap();
        sink.record_compression(&compression_report()).unwrap();

        let text = fs::read_to_string(sink.compression_sheet()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "run_id,source_dir,strategy,elapsed_ms,files,skipped");
        assert!(lines[1].ends_with(",/data/in,sequential,40,3,0"));
        assert!(lines[2].ends_with(",/data/in,parallel,15,3,0"));
    }

    #[test]
    fn decompression_row_has_both_timings() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvMetrics::new(dir.path().join("metrics"));
        let report = DecompressionReport {
            archive_path: PathBuf::from("/data/in.zip"),
            destination: PathBuf::from("/data/in"),
            samples: vec![
                TimingSample::new(SEQUENTIAL, Duration::from_millis(9)),
                TimingSample::new(PARALLEL, Duration::from_millis(4)),
            ],
            entries: 2,
            failures: Vec::new(),
        };

        sink.record_decompression(&report).unwrap();

        let mut reader = csv::Reader::from_path(sink.decompression_sheet()).unwrap();
        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][1], "/data/in.zip");
        assert_eq!(&records[0][2], "/data/in");
        assert_eq!(&records[0][3], "9");
        assert_eq!(&records[0][4], "4");
    }
}
