//! Combining per-file temp archives into one archive.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result, bail_format};
use crate::io::LocalFileReader;
use crate::zip::{ZipParser, ZipWriter};

use super::batch::ARCHIVE_EXTENSION;

/// Temp archives in `scratch`, in directory listing order.
fn temp_archives(scratch: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();
    for entry in fs::read_dir(scratch)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file()
            && path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION)
        {
            archives.push(path);
        }
    }
    Ok(archives)
}

/// Merge every temp archive in `scratch` into a new archive at `output`.
///
/// Each temp archive must hold exactly one entry. Its compressed stream is
/// copied as-is, so nothing is inflated or deflated again. Returns the number
/// of entries written.
///
/// On failure the partially written `output` is removed.
pub fn merge_archives(scratch: &Path, output: &Path) -> Result<usize> {
    let file = File::create(output).map_err(|source| Error::Resource {
        path: output.to_path_buf(),
        source,
    })?;

    match copy_entries(scratch, ZipWriter::new(BufWriter::new(file))) {
        Ok(count) => {
            tracing::info!(entries = count, archive = %output.display(), "archives merged");
            Ok(count)
        }
        Err(e) => {
            let _ = fs::remove_file(output);
            Err(Error::merge(output, e))
        }
    }
}

fn copy_entries(scratch: &Path, mut writer: ZipWriter<BufWriter<File>>) -> Result<usize> {
    for path in temp_archives(scratch)? {
        let parser = ZipParser::new(Arc::new(LocalFileReader::new(&path)?));
        let entries = parser.list_files()?;
        let [entry] = entries.as_slice() else {
            bail_format!(
                "{} holds {} entries, expected exactly one",
                path.display(),
                entries.len()
            );
        };

        let raw = parser.read_raw(entry)?;
        writer.add_raw(entry, &raw)?;
        tracing::debug!(entry = %entry.file_name, bytes = raw.len(), "entry copied");
    }

    let count = writer.entries().len();
    writer.finish()?;
    Ok(count)
}
