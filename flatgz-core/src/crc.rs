//! Checksums for the gzip trailer.
//!
//! The gzip writer and reader take the checksum as a collaborator through the
//! [`Checksum`] trait. [`Crc32`] is the standard ISO 3309 CRC-32 that every
//! other gzip tool expects. [`ZeroChecksum`] always reports zero; it produces
//! streams whose trailer only other flatgz builds (or readers that skip
//! verification) will accept.
//!
//! ## Performance
//!
//! CRC-32 uses slicing-by-8 for inputs of 16 bytes or more and a single
//! table lookup per byte otherwise.

/// A streaming checksum over the uncompressed data.
pub trait Checksum {
    /// Feed more data.
    fn update(&mut self, data: &[u8]);

    /// Checksum of everything fed so far.
    fn value(&self) -> u32;

    /// Start over as if no data had been fed.
    fn reset(&mut self);
}

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = CRC32_TABLE_SLICE[0];

/// Slicing-by-8 tables. Table 0 is the plain byte table.
const CRC32_TABLE_SLICE: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// CRC-32 calculator (ISO 3309), as used in the gzip trailer.
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value and final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use flatgz_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_bytewise(&mut self.crc, data);
        }
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Compute CRC-32 for a slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Crc32 {
    fn update(&mut self, data: &[u8]) {
        Crc32::update(self, data);
    }

    fn value(&self) -> u32 {
        Crc32::value(self)
    }

    fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }
}

#[inline]
fn crc32_bytewise(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc ^ byte as u32) & 0xFF) as usize;
        *crc = CRC32_TABLE[index] ^ (*crc >> 8);
    }
}

#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let crc_xor = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        c = CRC32_TABLE_SLICE[7][(crc_xor & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[6][((crc_xor >> 8) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[5][((crc_xor >> 16) & 0xFF) as usize]
            ^ CRC32_TABLE_SLICE[4][(crc_xor >> 24) as usize]
            ^ CRC32_TABLE_SLICE[3][bytes[4] as usize]
            ^ CRC32_TABLE_SLICE[2][bytes[5] as usize]
            ^ CRC32_TABLE_SLICE[1][bytes[6] as usize]
            ^ CRC32_TABLE_SLICE[0][bytes[7] as usize];
    }

    crc32_bytewise(&mut c, chunks.remainder());
    *crc = c;
}

/// Placeholder checksum that ignores its input and always reports zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroChecksum;

impl Checksum for ZeroChecksum {
    fn update(&mut self, _data: &[u8]) {}

    fn value(&self) -> u32 {
        0
    }

    fn reset(&mut self) {}
}
