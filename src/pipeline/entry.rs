//! Single-file compression into a standalone archive.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::zip::ZipWriter;

/// Compress `source` into a new archive at `target` holding one entry named
/// `entry_name`.
///
/// The archive is assembled in `<target>.partial` and renamed into place once
/// complete, so `target` is either the previous archive or a finished new
/// one. The partial file is removed on failure, which makes retrying with the
/// same arguments safe.
pub fn write_single_entry(source: &Path, entry_name: &str, target: &Path, level: u32) -> Result<()> {
    let partial = partial_path(target);

    match write_archive(source, entry_name, &partial, level) {
        Ok(()) => fs::rename(&partial, target).map_err(|e| {
            let _ = fs::remove_file(&partial);
            Error::entry(entry_name, e)
        }),
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(Error::entry(entry_name, e))
        }
    }
}

fn write_archive(source: &Path, entry_name: &str, output: &Path, level: u32) -> Result<()> {
    let input = File::open(source)?;
    let modified = input
        .metadata()
        .and_then(|m| m.modified())
        .unwrap_or_else(|_| SystemTime::now());

    let mut writer = ZipWriter::new(BufWriter::new(File::create(output)?));
    let entry = writer.add_file(entry_name, BufReader::new(input), modified, level)?;
    tracing::trace!(
        entry = entry_name,
        uncompressed = entry.uncompressed_size,
        compressed = entry.compressed_size,
        "entry deflated"
    );
    writer.finish()?;
    Ok(())
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LocalFileReader;
    use crate::zip::{DEFAULT_LEVEL, ZipExtractor};
    use std::sync::Arc;

    #[test]
    fn archive_holds_exactly_one_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.txt");
        fs::write(&source, b"quarterly numbers ".repeat(500)).unwrap();
        let target = dir.path().join("report.txt.zip");

        write_single_entry(&source, "report.txt", &target, DEFAULT_LEVEL).unwrap();

        let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&target).unwrap()));
        let entries = extractor.list_files().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "report.txt");
        assert_eq!(
            extractor.extract_to_memory(&entries[0]).unwrap(),
            fs::read(&source).unwrap()
        );
    }

    #[test]
    fn rewriting_overwrites_the_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.bin");
        let target = dir.path().join("a.bin.zip");

        fs::write(&source, b"first version").unwrap();
        write_single_entry(&source, "a.bin", &target, DEFAULT_LEVEL).unwrap();
        fs::write(&source, b"second").unwrap();
        write_single_entry(&source, "a.bin", &target, DEFAULT_LEVEL).unwrap();

        let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&target).unwrap()));
        let entry = extractor.list_files().unwrap().remove(0);
        assert_eq!(extractor.extract_to_memory(&entry).unwrap(), b"second");
    }

    #[test]
    fn missing_source_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ghost.zip");

        let err = write_single_entry(&dir.path().join("ghost"), "ghost", &target, DEFAULT_LEVEL)
            .unwrap_err();
        assert!(matches!(err, Error::EntryWrite { .. }));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }
}
