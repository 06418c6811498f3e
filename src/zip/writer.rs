//! ZIP archive writer.
//!
//! Produces plain single-disk archives: each entry is a Local File Header
//! followed by its data, then one Central Directory and the EOCD record.
//! Sizes and CRC are patched into the Local File Header after the data is
//! written, so the output needs to be seekable but no data descriptors are
//! emitted.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, CrcReader};
use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::SystemTime;

use crate::error::{Result, bail_format};

use super::structures::*;

/// Default DEFLATE level, the usual speed/size trade-off.
pub const DEFAULT_LEVEL: u32 = 6;

/// Largest entry count a classic EOCD can describe (0xFFFF means ZIP64).
const MAX_ENTRIES: usize = 0xFFFE;

/// Streaming ZIP writer over any seekable output.
pub struct ZipWriter<W: Write + Seek> {
    out: W,
    entries: Vec<ZipFileEntry>,
    names: HashSet<String>,
}

impl<W: Write + Seek> ZipWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Entries written so far, in archive order.
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Deflate `source` into a new entry called `name`.
    ///
    /// The data is streamed: CRC-32 and both sizes are accumulated while
    /// compressing and written back into the Local File Header afterwards.
    pub fn add_file<R: Read>(
        &mut self,
        name: &str,
        source: R,
        modified: SystemTime,
        level: u32,
    ) -> Result<&ZipFileEntry> {
        self.claim_name(name)?;

        let lfh_offset = self.out.stream_position()?;
        let (last_mod_time, last_mod_date) = dos_datetime(modified);
        let mut entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Deflate,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory: false,
        };
        entry.write_local_header(&mut self.out)?;

        let data_start = self.out.stream_position()?;
        let mut reader = CrcReader::new(source);
        let mut encoder = DeflateEncoder::new(&mut self.out, Compression::new(level.min(9)));
        entry.uncompressed_size = io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?;

        let data_end = self.out.stream_position()?;
        entry.compressed_size = data_end - data_start;
        entry.crc32 = reader.crc().sum();

        // Patch CRC-32, compressed size and uncompressed size in place
        self.out.seek(SeekFrom::Start(lfh_offset + LFH_CRC_OFFSET))?;
        self.out.write_u32::<LittleEndian>(entry.crc32)?;
        self.out
            .write_u32::<LittleEndian>(narrow_u32(entry.compressed_size)?)?;
        self.out
            .write_u32::<LittleEndian>(narrow_u32(entry.uncompressed_size)?)?;
        self.out.seek(SeekFrom::Start(data_end))?;

        Ok(self.push(entry))
    }

    /// Copy an already-compressed entry verbatim.
    ///
    /// `data` must be exactly the entry's compressed stream as read by
    /// [`ZipParser::read_raw`](super::ZipParser::read_raw); method, CRC and
    /// sizes are taken from `source` unchanged.
    pub fn add_raw(&mut self, source: &ZipFileEntry, data: &[u8]) -> Result<&ZipFileEntry> {
        if data.len() as u64 != source.compressed_size {
            bail_format!(
                "Entry {} has {} compressed bytes, expected {}",
                source.file_name,
                data.len(),
                source.compressed_size
            );
        }
        self.claim_name(&source.file_name)?;

        let mut entry = source.clone();
        entry.lfh_offset = self.out.stream_position()?;
        entry.write_local_header(&mut self.out)?;
        self.out.write_all(data)?;

        Ok(self.push(entry))
    }

    /// Write the Central Directory and EOCD, returning the underlying output.
    pub fn finish(mut self) -> Result<W> {
        if self.entries.len() > MAX_ENTRIES {
            bail_format!("{} entries exceed the ZIP limit", self.entries.len());
        }

        let cd_offset = self.out.stream_position()?;
        for entry in &self.entries {
            entry.write_central_header(&mut self.out)?;
        }
        let cd_size = self.out.stream_position()? - cd_offset;

        EndOfCentralDirectory::new(
            self.entries.len() as u16,
            narrow_u32(cd_size)?,
            narrow_u32(cd_offset)?,
        )
        .write_to(&mut self.out)?;
        self.out.flush()?;

        Ok(self.out)
    }

    fn claim_name(&mut self, name: &str) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            bail_format!("Duplicate entry name: {}", name);
        }
        Ok(())
    }

    fn push(&mut self, entry: ZipFileEntry) -> &ZipFileEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }
}
