//! # flatgz gzip
//!
//! GZIP container (RFC 1952) around the flatgz DEFLATE codec.
//!
//! A member is a 10-byte header (plus optional fields), a DEFLATE stream
//! with one block per 65 535-byte input chunk, and an 8-byte trailer
//! holding the checksum and the uncompressed size modulo 2^32.
//!
//! ## Example
//!
//! ```rust
//! let data = b"Hello, World!";
//!
//! let mut compressed = Vec::new();
//! flatgz_gzip::write(&mut &data[..], &mut compressed).unwrap();
//!
//! let mut decompressed = Vec::new();
//! flatgz_gzip::read(&mut compressed.as_slice(), &mut decompressed).unwrap();
//! assert_eq!(decompressed, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod header;
pub mod reader;
pub mod writer;

pub use header::{GzipHeader, GzipTrailer, flags};
pub use reader::{GzipReader, GzipReaderConfig, GzipSummary};
pub use writer::GzipWriter;

use flatgz_core::error::Result;
use flatgz_deflate::DeflateConfig;
use std::io::{Read, Write};

/// Decompress one gzip member from `input` into `output`.
///
/// The trailer is read but not verified. Returns the decompressed size.
pub fn read<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<u64> {
    let mut reader = GzipReader::new(input, GzipReaderConfig::default())?;
    Ok(reader.read_to(output)?.bytes_out)
}

/// Compress all of `input` into one gzip member on `output`, using fixed
/// Huffman blocks and a CRC-32 trailer. Returns the uncompressed size
/// modulo 2^32.
pub fn write<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<u32> {
    let trailer = GzipWriter::new(DeflateConfig::default()).write(input, output)?;
    Ok(trailer.size)
}

/// Compress `data` to a gzip member with the given block configuration.
pub fn compress(data: &[u8], config: DeflateConfig) -> Result<Vec<u8>> {
    GzipWriter::new(config).compress_to_vec(data)
}

/// Decompress a gzip member held in memory, verifying the trailer.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    GzipReader::new(data, GzipReaderConfig::VERIFY)?.decompress()
}
