//! GZIP member header and trailer.

use flatgz_core::crc::Crc32;
use flatgz_core::error::{FlatGzError, Result};
use log::warn;
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Operating system byte written by default (Unix).
pub const OS_UNIX: u8 = 3;

/// Size of the fixed part of the header.
pub const HEADER_FIXED_SIZE: usize = 10;

/// Size of the trailer.
pub const TRAILER_SIZE: usize = 8;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits RFC 1952 leaves reserved.
    pub const RESERVED: u8 = 0xE0;
}

/// GZIP member header.
///
/// The default is the minimal header `1f 8b 08 00 00000000 00 03`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GzipHeader {
    /// Compression method (8 for DEFLATE).
    pub method: u8,
    /// Flag byte as read, or as it will be written.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 if unknown).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Raw extra field (FEXTRA).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Vec<u8>>,
    /// Original filename (FNAME).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Comment (FCOMMENT).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Header CRC16 (FHCRC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_crc: Option<u16>,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            method: CM_DEFLATE,
            flags: 0,
            mtime: 0,
            xfl: 0,
            os: OS_UNIX,
            extra: None,
            filename: None,
            comment: None,
            header_crc: None,
        }
    }
}

impl GzipHeader {
    /// Create the minimal header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header carrying the original filename.
    pub fn with_filename(filename: &str) -> Self {
        Self {
            flags: flags::FNAME,
            filename: Some(filename.to_string()),
            ..Self::default()
        }
    }

    /// Set the comment.
    pub fn comment(mut self, comment: &str) -> Self {
        self.flags |= flags::FCOMMENT;
        self.comment = Some(comment.to_string());
        self
    }

    /// Set the modification time.
    pub fn mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    /// Request a header CRC16 when writing.
    pub fn header_crc(mut self) -> Self {
        self.flags |= flags::FHCRC;
        self
    }

    /// Whether a flag bit is set.
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let mut len = HEADER_FIXED_SIZE;
        if self.has_flag(flags::FEXTRA) {
            len += 2 + self.extra.as_ref().map_or(0, Vec::len);
        }
        if self.has_flag(flags::FNAME) {
            len += self.filename.as_ref().map_or(0, |s| s.chars().count()) + 1;
        }
        if self.has_flag(flags::FCOMMENT) {
            len += self.comment.as_ref().map_or(0, |s| s.chars().count()) + 1;
        }
        if self.has_flag(flags::FHCRC) {
            len += 2;
        }
        len
    }

    /// Write the header.
    ///
    /// Optional fields are written when their flag is set; a flagged field
    /// with no value is written empty. The header CRC16 is computed here.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&GZIP_MAGIC);
        buf.push(self.method);
        buf.push(self.flags);
        buf.extend_from_slice(&self.mtime.to_le_bytes());
        buf.push(self.xfl);
        buf.push(self.os);

        if self.has_flag(flags::FEXTRA) {
            let extra = self.extra.as_deref().unwrap_or_default();
            let xlen = u16::try_from(extra.len()).map_err(|_| {
                FlatGzError::invalid_container_header("extra field longer than 65535 bytes")
            })?;
            buf.extend_from_slice(&xlen.to_le_bytes());
            buf.extend_from_slice(extra);
        }

        if self.has_flag(flags::FNAME) {
            put_zero_terminated(&mut buf, self.filename.as_deref().unwrap_or_default())?;
        }

        if self.has_flag(flags::FCOMMENT) {
            put_zero_terminated(&mut buf, self.comment.as_deref().unwrap_or_default())?;
        }

        if self.has_flag(flags::FHCRC) {
            let crc16 = Crc32::compute(&buf) as u16;
            buf.extend_from_slice(&crc16.to_le_bytes());
        }

        writer.write_all(&buf)?;
        Ok(())
    }

    /// Read a header, validating the magic bytes and compression method.
    ///
    /// Optional fields are consumed according to the flag byte. The header
    /// CRC16 is stored but not checked.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_FIXED_SIZE];
        read_field(reader, &mut buf, "fixed header")?;

        if buf[0..2] != GZIP_MAGIC {
            return Err(FlatGzError::invalid_container_header(format!(
                "bad magic bytes {:02x} {:02x}",
                buf[0], buf[1]
            )));
        }

        let method = buf[2];
        if method != CM_DEFLATE {
            return Err(FlatGzError::invalid_container_header(format!(
                "unsupported compression method {}",
                method
            )));
        }

        let flag_byte = buf[3];
        let mtime = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let xfl = buf[8];
        let os = buf[9];

        if flag_byte & flags::RESERVED != 0 {
            warn!("reserved gzip flag bits set: {:#04x}", flag_byte);
        }

        let mut extra = None;
        if flag_byte & flags::FEXTRA != 0 {
            let mut xlen_buf = [0u8; 2];
            read_field(reader, &mut xlen_buf, "extra field length")?;
            let mut data = vec![0u8; u16::from_le_bytes(xlen_buf) as usize];
            read_field(reader, &mut data, "extra field")?;
            extra = Some(data);
        }

        let filename = if flag_byte & flags::FNAME != 0 {
            Some(read_zero_terminated(reader, "filename")?)
        } else {
            None
        };

        let comment = if flag_byte & flags::FCOMMENT != 0 {
            Some(read_zero_terminated(reader, "comment")?)
        } else {
            None
        };

        let mut header_crc = None;
        if flag_byte & flags::FHCRC != 0 {
            let mut crc_buf = [0u8; 2];
            read_field(reader, &mut crc_buf, "header CRC")?;
            header_crc = Some(u16::from_le_bytes(crc_buf));
        }

        Ok(Self {
            method,
            flags: flag_byte,
            mtime,
            xfl,
            os,
            extra,
            filename,
            comment,
            header_crc,
        })
    }
}

/// GZIP member trailer: checksum of the uncompressed data and its size
/// modulo 2^32, both little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GzipTrailer {
    /// Checksum of the uncompressed data (CRC-32 unless the writer was
    /// given another checksum).
    pub crc32: u32,
    /// Uncompressed size modulo 2^32.
    pub size: u32,
}

impl GzipTrailer {
    /// Trailer for `size` bytes with checksum `crc32`.
    pub fn new(crc32: u32, size: u64) -> Self {
        Self {
            crc32,
            size: size as u32,
        }
    }

    /// The 8 trailer bytes.
    pub fn to_bytes(&self) -> [u8; TRAILER_SIZE] {
        let mut bytes = [0u8; TRAILER_SIZE];
        bytes[..4].copy_from_slice(&self.crc32.to_le_bytes());
        bytes[4..].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// Parse the 8 trailer bytes.
    pub fn from_bytes(bytes: [u8; TRAILER_SIZE]) -> Self {
        Self {
            crc32: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Write `text` as zero-terminated ISO 8859-1.
fn put_zero_terminated(buf: &mut Vec<u8>, text: &str) -> Result<()> {
    for c in text.chars() {
        match u8::try_from(c) {
            Ok(0) | Err(_) => {
                return Err(FlatGzError::invalid_container_header(format!(
                    "{:?} cannot be stored in a gzip header string",
                    c
                )));
            }
            Ok(byte) => buf.push(byte),
        }
    }
    buf.push(0);
    Ok(())
}

/// Fill `buf`, reporting a short read as a header error.
fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            FlatGzError::invalid_container_header(format!("input ends inside the {}", what))
        } else {
            e.into()
        }
    })
}

/// Read a zero-terminated ISO 8859-1 string.
fn read_zero_terminated<R: Read>(reader: &mut R, what: &str) -> Result<String> {
    let mut text = String::new();
    let mut byte = [0u8; 1];

    loop {
        read_field(reader, &mut byte, what)?;
        if byte[0] == 0 {
            break;
        }
        text.push(char::from(byte[0]));
    }

    Ok(text)
}
