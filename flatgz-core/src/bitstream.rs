//! Bit-level I/O for the DEFLATE bit stream.
//!
//! This module provides [`BitReader`] and [`BitWriter`], which move single
//! bits and fixed-width bit groups to and from a byte-oriented stream.
//!
//! # Bit Ordering
//!
//! Inside a byte, bits are always filled starting at the least significant
//! bit. The order in which the bits of a multi-bit *value* are emitted is
//! chosen per call with [`BitOrder`]:
//!
//! - [`BitOrder::LowBitFirst`]: bit 0 of the value goes out first. DEFLATE
//!   uses this for header fields, extra bits and stored lengths.
//! - [`BitOrder::HighBitFirst`]: the most significant of the `count` bits goes
//!   out first. DEFLATE packs prefix codes this way.
//!
//! # Example
//!
//! ```
//! use flatgz_core::bitstream::{BitOrder, BitReader, BitWriter};
//! use std::io::Cursor;
//!
//! let mut output = Vec::new();
//! {
//!     let mut writer = BitWriter::new(&mut output);
//!     writer.put_bits(0b101, 3, BitOrder::LowBitFirst).unwrap();
//!     writer.put_bits(0b1100, 4, BitOrder::HighBitFirst).unwrap();
//!     writer.finish().unwrap();
//! }
//!
//! let mut reader = BitReader::new(Cursor::new(&output));
//! assert_eq!(reader.get_bits(3, BitOrder::LowBitFirst).unwrap(), 0b101);
//! assert_eq!(reader.get_bits(4, BitOrder::HighBitFirst).unwrap(), 0b1100);
//! ```

use crate::error::Result;
use std::io::{ErrorKind, Read, Write};

/// Order in which the bits of a multi-bit value are transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Least significant bit of the value first.
    #[default]
    LowBitFirst,
    /// Most significant bit (of the requested width) first.
    HighBitFirst,
}

/// A bit-level reader that wraps any `Read` implementation.
///
/// Running out of input is not an error here: once the source is exhausted
/// every further bit reads as zero and [`BitReader::eof`] reports `true`.
/// Decoders check `eof()` at the points where they need real data and turn
/// it into a truncated-stream error themselves. Genuine I/O failures are
/// still propagated.
///
/// Reads one byte at a time from the source, so wrap files in a
/// `BufReader`.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    /// Underlying reader.
    reader: R,
    /// Byte currently being consumed.
    current_byte: u8,
    /// Unconsumed bits left in `current_byte` (0 means fetch a new byte).
    bits_left: u8,
    /// Set once a byte fetch hit end of stream.
    eof: bool,
    /// Total bits read (for error reporting).
    total_bits_read: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new `BitReader` wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            current_byte: 0,
            bits_left: 0,
            eof: false,
            total_bits_read: 0,
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume this `BitReader` and return the underlying reader.
    ///
    /// Bits left in a partially consumed byte are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Whether the reader sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.bits_left == 0
    }

    /// Whether a read has run past the end of the underlying source.
    pub fn eof(&self) -> bool {
        self.eof
    }

    fn fetch_byte(&mut self) -> Result<()> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => {
                    self.eof = true;
                    self.current_byte = 0;
                    break;
                }
                Ok(_) => {
                    self.current_byte = byte[0];
                    break;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.bits_left = 8;
        Ok(())
    }

    /// Read a single bit.
    #[inline]
    pub fn get_single_bit(&mut self) -> Result<bool> {
        if self.bits_left == 0 {
            self.fetch_byte()?;
        }

        let bit = self.current_byte & 1 != 0;
        self.current_byte >>= 1;
        self.bits_left -= 1;
        self.total_bits_read += 1;

        Ok(bit)
    }

    /// Read `count` bits (1-64) as an unsigned value.
    pub fn get_bits(&mut self, count: u8, order: BitOrder) -> Result<u64> {
        debug_assert!(
            (1..=64).contains(&count),
            "bit count must be 1-64, got {}",
            count
        );

        let mut value = 0u64;
        match order {
            BitOrder::LowBitFirst => {
                for i in 0..count {
                    value |= (self.get_single_bit()? as u64) << i;
                }
            }
            BitOrder::HighBitFirst => {
                for _ in 0..count {
                    value = (value << 1) | self.get_single_bit()? as u64;
                }
            }
        }

        Ok(value)
    }

    /// Read an 8-bit value, low bit first.
    pub fn get_byte(&mut self) -> Result<u8> {
        Ok(self.get_bits(8, BitOrder::LowBitFirst)? as u8)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        self.total_bits_read += self.bits_left as u64;
        self.bits_left = 0;
        self.current_byte = 0;
    }
}

/// A bit-level writer that wraps any `Write` implementation.
///
/// Bits accumulate in a pending byte which is written out as soon as it is
/// full. Call [`BitWriter::finish`] when done to pad and emit the last
/// partial byte.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    /// Underlying writer.
    writer: W,
    /// Byte being filled (LSB first).
    current_byte: u8,
    /// Number of bits already placed in `current_byte`.
    bits_filled: u8,
    /// Total bits written.
    total_bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a new `BitWriter` wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            current_byte: 0,
            bits_filled: 0,
            total_bits_written: 0,
        }
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying writer.
    ///
    /// Writing directly while a partial byte is pending corrupts the stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Pad the pending byte, flush, and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.writer)
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    /// Whether the writer sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.bits_filled == 0
    }

    /// Write a single bit.
    #[inline]
    pub fn put_single_bit(&mut self, bit: bool) -> Result<()> {
        self.current_byte |= (bit as u8) << self.bits_filled;
        self.bits_filled += 1;
        self.total_bits_written += 1;

        if self.bits_filled == 8 {
            self.writer.write_all(&[self.current_byte])?;
            self.current_byte = 0;
            self.bits_filled = 0;
        }

        Ok(())
    }

    /// Write the low `count` bits (1-64) of `value`.
    pub fn put_bits(&mut self, value: u64, count: u8, order: BitOrder) -> Result<()> {
        debug_assert!(
            (1..=64).contains(&count),
            "bit count must be 1-64, got {}",
            count
        );

        match order {
            BitOrder::LowBitFirst => {
                for i in 0..count {
                    self.put_single_bit((value >> i) & 1 != 0)?;
                }
            }
            BitOrder::HighBitFirst => {
                for i in (0..count).rev() {
                    self.put_single_bit((value >> i) & 1 != 0)?;
                }
            }
        }

        Ok(())
    }

    /// Write whole bytes. Aligned writes go straight to the sink.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.is_aligned() {
            self.writer.write_all(bytes)?;
            self.total_bits_written += bytes.len() as u64 * 8;
        } else {
            for &byte in bytes {
                self.put_bits(byte as u64, 8, BitOrder::LowBitFirst)?;
            }
        }
        Ok(())
    }

    /// Emit zero bits until the writer is byte-aligned.
    pub fn pad_to_byte(&mut self) -> Result<()> {
        while !self.is_aligned() {
            self.put_single_bit(false)?;
        }
        Ok(())
    }

    /// Pad the last partial byte and flush the underlying writer.
    pub fn finish(&mut self) -> Result<()> {
        self.pad_to_byte()?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_bitreader_basic() {
        // 0b10110101 = 0xB5
        let data = vec![0xB5];
        let mut reader = BitReader::new(Cursor::new(data));

        let bits: Vec<bool> = (0..8).map(|_| reader.get_single_bit().unwrap()).collect();
        assert_eq!(
            bits,
            [true, false, true, false, true, true, false, true] // LSB first
        );
        assert!(!reader.eof());
    }

    #[test]
    fn test_bitreader_multi_byte() {
        let data = vec![0xFF, 0x00];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(reader.get_bits(4, BitOrder::LowBitFirst).unwrap(), 0xF);
        assert_eq!(reader.get_bits(8, BitOrder::LowBitFirst).unwrap(), 0x0F); // Crosses byte boundary
        assert_eq!(reader.get_bits(4, BitOrder::LowBitFirst).unwrap(), 0x0);
    }

    #[test]
    fn test_bitreader_high_bit_first() {
        // Stream bits: 1,0,1,0,1,1,0,1
        let data = vec![0xB5];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(reader.get_bits(3, BitOrder::HighBitFirst).unwrap(), 0b101);
        assert_eq!(reader.get_bits(5, BitOrder::HighBitFirst).unwrap(), 0b01101);
    }

    #[test]
    fn test_bitreader_eof_reads_zero() {
        let mut reader = BitReader::new(Cursor::new(vec![0x01]));

        assert_eq!(reader.get_bits(8, BitOrder::LowBitFirst).unwrap(), 1);
        assert!(!reader.eof());
        assert_eq!(reader.get_bits(5, BitOrder::LowBitFirst).unwrap(), 0);
        assert!(reader.eof());
    }

    #[test]
    fn test_bitwriter_basic() {
        let mut output = Vec::new();
        {
            let mut writer = BitWriter::new(&mut output);
            for bit in [true, false, true, false, true, true, false, true] {
                writer.put_single_bit(bit).unwrap();
            }
            writer.finish().unwrap();
        }
        assert_eq!(output, vec![0xB5]);
    }

    #[test]
    fn test_bitwriter_multi_bits() {
        let mut output = Vec::new();
        {
            let mut writer = BitWriter::new(&mut output);
            writer.put_bits(0b101, 3, BitOrder::LowBitFirst).unwrap();
            writer.put_bits(0b11001, 5, BitOrder::LowBitFirst).unwrap();
            writer.finish().unwrap();
        }
        // 3 bits: 101, 5 bits: 11001 -> 11001_101 = 0xCD
        assert_eq!(output, vec![0xCD]);
    }

    #[test]
    fn test_bitwriter_high_bit_first_reverses() {
        let mut output = Vec::new();
        {
            let mut writer = BitWriter::new(&mut output);
            writer.put_bits(0b110, 3, BitOrder::HighBitFirst).unwrap();
            writer.finish().unwrap();
        }
        // Emitted 1,1,0 -> bits 0,1 set
        assert_eq!(output, vec![0b011]);
    }

    #[test]
    fn test_pad_and_align() {
        let mut output = Vec::new();
        {
            let mut writer = BitWriter::new(&mut output);
            writer.put_bits(0b111, 3, BitOrder::LowBitFirst).unwrap();
            writer.pad_to_byte().unwrap();
            assert!(writer.is_aligned());
            assert_eq!(writer.bits_written(), 8);
            writer.put_bytes(&[0xAA, 0x55]).unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(output, vec![0x07, 0xAA, 0x55]);

        let mut reader = BitReader::new(Cursor::new(&output));
        reader.get_bits(3, BitOrder::LowBitFirst).unwrap();
        reader.align_to_byte();
        assert!(reader.is_aligned());
        assert_eq!(reader.get_byte().unwrap(), 0xAA);
        assert_eq!(reader.get_byte().unwrap(), 0x55);
        assert_eq!(reader.bit_position(), 24);
    }

    #[test]
    fn test_finish_on_aligned_writer_adds_nothing() {
        let mut output = Vec::new();
        let mut writer = BitWriter::new(&mut output);
        writer.put_bits(0xAB, 8, BitOrder::LowBitFirst).unwrap();
        writer.finish().unwrap();
        writer.finish().unwrap();
        assert_eq!(output, vec![0xAB]);
    }

    #[test]
    fn test_full_width_values() {
        let mut output = Vec::new();
        {
            let mut writer = BitWriter::new(&mut output);
            writer.put_bits(u64::MAX - 1, 64, BitOrder::LowBitFirst).unwrap();
            writer.put_bits(0x8000_0000_0000_0001, 64, BitOrder::HighBitFirst).unwrap();
            writer.finish().unwrap();
        }
        let mut reader = BitReader::new(Cursor::new(&output));
        assert_eq!(reader.get_bits(64, BitOrder::LowBitFirst).unwrap(), u64::MAX - 1);
        assert_eq!(
            reader.get_bits(64, BitOrder::HighBitFirst).unwrap(),
            0x8000_0000_0000_0001
        );
    }

    fn order_strategy() -> impl Strategy<Value = BitOrder> {
        prop_oneof![Just(BitOrder::LowBitFirst), Just(BitOrder::HighBitFirst)]
    }

    proptest! {
        #[test]
        fn test_bit_io_symmetry(
            fields in proptest::collection::vec((any::<u64>(), 1u8..=64, order_strategy()), 1..32)
        ) {
            let mut output = Vec::new();
            {
                let mut writer = BitWriter::new(&mut output);
                for &(value, count, order) in &fields {
                    writer.put_bits(value, count, order).unwrap();
                }
                writer.finish().unwrap();
            }

            let mut reader = BitReader::new(Cursor::new(&output));
            for &(value, count, order) in &fields {
                let mask = if count == 64 { u64::MAX } else { (1u64 << count) - 1 };
                prop_assert_eq!(reader.get_bits(count, order).unwrap(), value & mask);
            }
            prop_assert!(!reader.eof());
        }
    }
}
