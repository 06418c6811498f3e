//! ZIP archive reading and writing.
//!
//! This module provides the container format used for both the per-file
//! temporary archives and the combined archive.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`writer`]: Streaming archive writer, including verbatim entry copies
//! - [`extractor`]: Inflating entries back to memory or disk
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Because every entry is compressed independently, an entry's compressed
//! stream can be lifted out of one archive and placed into another without
//! inflating it. The merger relies on this.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions when reading
//! - STORED (no compression) and DEFLATE methods when reading
//! - DEFLATE when writing
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Written archives are limited to 4 GiB and 65534 entries

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{DEFAULT_LEVEL, ZipWriter};
