//! GZIP decompression.

use crate::header::{GzipHeader, GzipTrailer, TRAILER_SIZE};
use flatgz_core::bitstream::BitReader;
use flatgz_core::crc::{Checksum, Crc32};
use flatgz_core::error::{FlatGzError, Result};
use flatgz_deflate::Inflater;
use log::{debug, warn};
use serde::Serialize;
use std::io::{self, Read, Write};

/// Decompression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GzipReaderConfig {
    /// Check the trailer's CRC-32 and size against the decoded data.
    pub verify_trailer: bool,
}

impl GzipReaderConfig {
    /// Ignore the trailer beyond reading it.
    pub const LENIENT: Self = Self {
        verify_trailer: false,
    };

    /// Fail on a missing or mismatching trailer.
    pub const VERIFY: Self = Self {
        verify_trailer: true,
    };

    /// Create the default (lenient) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable trailer verification.
    pub fn with_verify_trailer(mut self, verify: bool) -> Self {
        self.verify_trailer = verify;
        self
    }
}

/// What a completed decode produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GzipSummary {
    /// Decompressed bytes written to the output.
    pub bytes_out: u64,
    /// DEFLATE blocks decoded.
    pub blocks: u64,
    /// Trailer as found in the input, if it was complete.
    pub trailer: Option<GzipTrailer>,
    /// CRC-32 of the decoded bytes.
    pub computed_crc32: u32,
}

impl GzipSummary {
    /// Whether the trailer is present and agrees with the decoded data.
    pub fn trailer_matches(&self) -> bool {
        self.trailer.is_some_and(|t| {
            t.crc32 == self.computed_crc32 && t.size == self.bytes_out as u32
        })
    }
}

/// GZIP reader. The header is parsed on construction.
#[derive(Debug)]
pub struct GzipReader<R: Read> {
    reader: BitReader<R>,
    header: GzipHeader,
    config: GzipReaderConfig,
}

impl<R: Read> GzipReader<R> {
    /// Parse the header from `reader`.
    pub fn new(mut reader: R, config: GzipReaderConfig) -> Result<Self> {
        let header = GzipHeader::read(&mut reader)?;
        debug!(
            "gzip header: flags={:#04x} mtime={} os={} name={:?}",
            header.flags, header.mtime, header.os, header.filename
        );
        Ok(Self {
            reader: BitReader::new(reader),
            header,
            config,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &GzipHeader {
        &self.header
    }

    /// Decode the member body into `output`, then read the trailer.
    pub fn read_to<W: Write>(&mut self, output: &mut W) -> Result<GzipSummary> {
        let mut inflater = Inflater::new();
        let mut sink = ChecksumWriter::new(output);
        inflater.inflate(&mut self.reader, &mut sink)?;
        sink.flush()?;

        self.reader.align_to_byte();
        let mut bytes = [0u8; TRAILER_SIZE];
        for byte in bytes.iter_mut() {
            *byte = self.reader.get_byte()?;
        }
        let trailer = if self.reader.eof() {
            None
        } else {
            Some(GzipTrailer::from_bytes(bytes))
        };

        let summary = GzipSummary {
            bytes_out: inflater.total_out(),
            blocks: inflater.blocks_read(),
            trailer,
            computed_crc32: sink.checksum.value(),
        };
        self.check_trailer(&summary)?;
        Ok(summary)
    }

    /// Decode the member body and return the bytes.
    pub fn decompress(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.read_to(&mut output)?;
        Ok(output)
    }

    fn check_trailer(&self, summary: &GzipSummary) -> Result<()> {
        let size = summary.bytes_out as u32;
        let Some(trailer) = summary.trailer else {
            if self.config.verify_trailer {
                return Err(FlatGzError::truncated(
                    self.reader.bit_position(),
                    "gzip trailer",
                ));
            }
            warn!("gzip trailer missing or incomplete; ignored");
            return Ok(());
        };

        if trailer.crc32 != summary.computed_crc32 {
            if self.config.verify_trailer {
                return Err(FlatGzError::checksum_mismatch(
                    trailer.crc32,
                    summary.computed_crc32,
                ));
            }
            warn!(
                "trailer checksum {:#010x} differs from computed {:#010x}; ignored",
                trailer.crc32, summary.computed_crc32
            );
        }

        if trailer.size != size {
            if self.config.verify_trailer {
                return Err(FlatGzError::size_mismatch(trailer.size, size));
            }
            warn!(
                "trailer size {} differs from decoded size {}; ignored",
                trailer.size, size
            );
        }

        Ok(())
    }
}

/// Passes bytes through while computing their CRC-32.
struct ChecksumWriter<W: Write> {
    inner: W,
    checksum: Crc32,
}

impl<W: Write> ChecksumWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            checksum: Crc32::new(),
        }
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        Checksum::update(&mut self.checksum, &buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
