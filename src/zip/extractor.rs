use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, bail_format};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound of the up-front buffer reservation when inflating an entry.
const MAX_RESERVE: u64 = 1 << 20;

/// ZIP file extractor
///
/// Cheap to share by reference across threads: every read goes through
/// positional I/O on the shared reader.
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Extract file data to memory, verifying size and CRC-32
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let raw = self.parser.read_raw(entry)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // Sizes come from the archive: cap the reservation and stop
                // inflating one byte past the declared size
                let capacity = entry
                    .uncompressed_size
                    .min((raw.len() as u64).saturating_mul(4))
                    .min(MAX_RESERVE);
                let mut data = Vec::with_capacity(capacity as usize);
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut data)?;
                data
            }
            CompressionMethod::Unknown(method) => {
                bail_format!(
                    "Unsupported compression method {} for {}",
                    method,
                    entry.file_name
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail_format!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail_format!("CRC-32 mismatch for {}", entry.file_name);
        }

        Ok(data)
    }

    /// Extract file to disk
    pub fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let data = self.extract_to_memory(entry)?;
        fs::write(output_path, &data)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::{DEFAULT_LEVEL, ZipWriter};
    use std::io::Cursor;
    use std::time::SystemTime;

    fn archive_with(name: &str, data: &[u8]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_file(name, data, SystemTime::now(), DEFAULT_LEVEL)
            .unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn inflates_deflated_entries() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let extractor = ZipExtractor::new(Arc::new(archive_with("blob.bin", &data)));
        let entry = extractor.list_files().unwrap().remove(0);
        assert_eq!(extractor.extract_to_memory(&entry).unwrap(), data);
    }

    #[test]
    fn detects_crc_mismatch() {
        let extractor = ZipExtractor::new(Arc::new(archive_with("a.txt", b"payload")));
        let mut entry = extractor.list_files().unwrap().remove(0);
        entry.crc32 ^= 1;
        let err = extractor.extract_to_memory(&entry).unwrap_err();
        assert!(err.to_string().contains("CRC-32 mismatch"));
    }

    /// One deflated entry whose central directory claims `claimed` bytes
    /// through a ZIP64 extra field.
    fn archive_claiming_size(name: &str, data: &[u8], claimed: u64) -> Vec<u8> {
        use crate::zip::structures::{CDFH_SIGNATURE, EndOfCentralDirectory, LFH_SIGNATURE};
        use byteorder::{LittleEndian, WriteBytesExt};
        use std::io::Write;

        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        let packed = encoder.finish().unwrap();
        let mut crc = Crc::new();
        crc.update(data);

        let mut out = Vec::new();
        out.extend_from_slice(LFH_SIGNATURE);
        for field in [20u16, 0, 8, 0, 0] {
            out.write_u16::<LittleEndian>(field).unwrap();
        }
        out.write_u32::<LittleEndian>(crc.sum()).unwrap();
        out.write_u32::<LittleEndian>(packed.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&packed);

        let cd_offset = out.len();
        out.extend_from_slice(CDFH_SIGNATURE);
        for field in [20u16, 20, 0, 8, 0, 0] {
            out.write_u16::<LittleEndian>(field).unwrap();
        }
        out.write_u32::<LittleEndian>(crc.sum()).unwrap();
        out.write_u32::<LittleEndian>(packed.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(12).unwrap();
        for field in [0u16, 0, 0] {
            out.write_u16::<LittleEndian>(field).unwrap();
        }
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.write_u16::<LittleEndian>(0x0001).unwrap();
        out.write_u16::<LittleEndian>(8).unwrap();
        out.write_u64::<LittleEndian>(claimed).unwrap();
        let cd_size = out.len() - cd_offset;

        EndOfCentralDirectory::new(1, cd_size as u32, cd_offset as u32)
            .write_to(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn huge_claimed_size_is_an_error_not_a_panic() {
        let extractor =
            ZipExtractor::new(Arc::new(archive_claiming_size("a.txt", b"hi", u64::MAX)));
        let entry = extractor.list_files().unwrap().remove(0);
        assert_eq!(entry.uncompressed_size, u64::MAX);

        let err = extractor.extract_to_memory(&entry).unwrap_err();
        assert!(err.to_string().contains("Size mismatch"));
    }

    #[test]
    fn inflation_stops_just_past_the_claimed_size() {
        let data = vec![0u8; 1 << 20];
        let extractor = ZipExtractor::new(Arc::new(archive_claiming_size("zeros", &data, 16)));
        let entry = extractor.list_files().unwrap().remove(0);

        let err = extractor.extract_to_memory(&entry).unwrap_err();
        assert!(err.to_string().contains("expected 16 bytes, got 17"));
    }

    #[test]
    fn rejects_unknown_methods() {
        let extractor = ZipExtractor::new(Arc::new(archive_with("a.txt", b"payload")));
        let mut entry = extractor.list_files().unwrap().remove(0);
        entry.compression_method = CompressionMethod::Unknown(12);
        assert!(extractor.extract_to_memory(&entry).is_err());
    }

    #[test]
    fn writes_into_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = ZipExtractor::new(Arc::new(archive_with("a.txt", b"payload")));
        let entry = extractor.list_files().unwrap().remove(0);

        let target = dir.path().join("nested").join("a.txt");
        extractor.extract_to_file(&entry, &target).unwrap();
        assert_eq!(fs::read(target).unwrap(), b"payload");
    }
}
