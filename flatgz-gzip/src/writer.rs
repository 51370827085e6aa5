//! GZIP compression.

use crate::header::{GzipHeader, GzipTrailer};
use flatgz_core::bitstream::BitWriter;
use flatgz_core::crc::{Checksum, Crc32};
use flatgz_core::error::Result;
use flatgz_deflate::{CHUNK_SIZE, DeflateConfig, Deflater};
use log::debug;
use std::io::{ErrorKind, Read, Write};

/// GZIP writer: header, one DEFLATE block per input chunk, trailer.
///
/// The trailer checksum is computed by `C`, CRC-32 unless another
/// [`Checksum`] is supplied with [`GzipWriter::with_checksum`].
#[derive(Debug)]
pub struct GzipWriter<C: Checksum = Crc32> {
    header: GzipHeader,
    config: DeflateConfig,
    checksum: C,
}

impl GzipWriter {
    /// Create a writer using CRC-32 for the trailer.
    pub fn new(config: DeflateConfig) -> Self {
        Self::with_checksum(config, Crc32::new())
    }
}

impl<C: Checksum> GzipWriter<C> {
    /// Create a writer that computes the trailer checksum with `checksum`.
    pub fn with_checksum(config: DeflateConfig, checksum: C) -> Self {
        Self {
            header: GzipHeader::new(),
            config,
            checksum,
        }
    }

    /// Replace the header.
    pub fn header(mut self, header: GzipHeader) -> Self {
        self.header = header;
        self
    }

    /// The compressor configuration.
    pub fn config(&self) -> &DeflateConfig {
        &self.config
    }

    /// Compress everything `input` yields into one gzip member on `output`.
    ///
    /// Input is consumed in chunks of [`CHUNK_SIZE`] bytes; each chunk
    /// becomes one block, and the block for the last chunk is final. Empty
    /// input yields a single empty final block.
    pub fn write<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<GzipTrailer> {
        self.checksum.reset();
        self.header.write(output)?;

        let mut deflater = Deflater::new(self.config);
        let mut total_in = 0u64;
        let bits_written;
        {
            let mut writer = BitWriter::new(&mut *output);
            let mut current = vec![0u8; CHUNK_SIZE];
            let mut next = vec![0u8; CHUNK_SIZE];
            let mut current_len = fill_chunk(input, &mut current)?;

            loop {
                // Look one chunk ahead to learn whether this one is last.
                let next_len = if current_len == CHUNK_SIZE {
                    fill_chunk(input, &mut next)?
                } else {
                    0
                };
                let is_last = next_len == 0;

                let chunk = &current[..current_len];
                self.checksum.update(chunk);
                total_in += current_len as u64;
                deflater.write_block(&mut writer, chunk, is_last)?;

                if is_last {
                    break;
                }
                std::mem::swap(&mut current, &mut next);
                current_len = next_len;
            }

            writer.finish()?;
            bits_written = writer.bits_written();
        }

        let trailer = GzipTrailer::new(self.checksum.value(), total_in);
        output.write_all(&trailer.to_bytes())?;
        output.flush()?;

        debug!(
            "gzip member: {} bytes in, {} deflate bytes, {} blocks, checksum {:#010x}",
            total_in,
            bits_written.div_ceil(8),
            deflater.blocks_written(),
            trailer.crc32
        );
        Ok(trailer)
    }

    /// Compress `data` and return the gzip bytes.
    pub fn compress_to_vec(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.write(&mut &data[..], &mut output)?;
        Ok(output)
    }
}

impl Default for GzipWriter {
    fn default() -> Self {
        Self::new(DeflateConfig::default())
    }
}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill_chunk<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatgz_core::crc::ZeroChecksum;

    #[test]
    fn test_empty_member_layout() {
        let out = GzipWriter::new(DeflateConfig::default()).compress_to_vec(b"").unwrap();
        // Header, one empty fixed block, trailer of zeros.
        assert_eq!(&out[..10], &[0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03]);
        assert_eq!(&out[10..12], &[0x03, 0x00]);
        assert_eq!(&out[12..], &[0u8; 8]);
    }

    #[test]
    fn test_trailer_values() {
        let data = b"123456789";
        let mut writer = GzipWriter::new(DeflateConfig::STORED);
        let out = writer.compress_to_vec(data).unwrap();

        let tail: [u8; 8] = out[out.len() - 8..].try_into().unwrap();
        let trailer = GzipTrailer::from_bytes(tail);
        assert_eq!(trailer.crc32, 0xCBF43926);
        assert_eq!(trailer.size, 9);
    }

    #[test]
    fn test_zero_checksum() {
        let mut writer = GzipWriter::with_checksum(DeflateConfig::FIXED, ZeroChecksum);
        let out = writer.compress_to_vec(b"placeholder checksum").unwrap();
        assert_eq!(&out[out.len() - 8..out.len() - 4], &[0, 0, 0, 0]);
        assert_eq!(out[out.len() - 4], 20);
    }

    #[test]
    fn test_writer_reuse_resets_checksum() {
        let mut writer = GzipWriter::new(DeflateConfig::default());
        let first = writer.compress_to_vec(b"same input").unwrap();
        let second = writer.compress_to_vec(b"same input").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_boundary_sizes() {
        // Exactly one chunk must still end with a final block and no extra
        // empty block.
        let data = vec![7u8; CHUNK_SIZE];
        let out = GzipWriter::new(DeflateConfig::STORED)
            .compress_to_vec(&data)
            .unwrap();
        // 10 header + 5 block header + data + 8 trailer.
        assert_eq!(out.len(), 10 + 5 + CHUNK_SIZE + 8);
        assert_eq!(out[10], 0x01);
    }
}
