//! DEFLATE decompression (inflate).
//!
//! [`Inflater`] runs the block loop until it has decoded a block with the
//! final flag set. All three block types are supported:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Decoded bytes pass through a 32 KB [`HistoryWindow`] that resolves
//! back-references, and are handed to the output sink in batches.

use crate::config::BlockType;
use crate::tables::{
    CODE_LENGTH_ORDER, END_OF_BLOCK, NUM_CODE_LENGTH_SYMBOLS, distance_code_info,
    fixed_distance_tree, fixed_litlen_tree, length_code_info,
};
use crate::tree::HuffmanTree;
use flatgz_core::bitstream::{BitOrder, BitReader};
use flatgz_core::error::{FlatGzError, Result};
use flatgz_core::window::HistoryWindow;
use log::{debug, trace};
use std::io::{Read, Write};

/// Pending output is handed to the sink once it grows past this.
const FLUSH_THRESHOLD: usize = 64 * 1024;

/// DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater {
    window: HistoryWindow,
    /// Decoded bytes not yet written to the sink.
    pending: Vec<u8>,
    total_out: u64,
    blocks_read: u64,
}

impl Inflater {
    /// Create a decompressor.
    pub fn new() -> Self {
        Self {
            window: HistoryWindow::deflate(),
            pending: Vec::with_capacity(FLUSH_THRESHOLD),
            total_out: 0,
            blocks_read: 0,
        }
    }

    /// Bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Blocks decoded so far.
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.window.clear();
        self.pending.clear();
        self.total_out = 0;
        self.blocks_read = 0;
    }

    /// Decode blocks until the final one, writing the bytes to `output`.
    ///
    /// Returns the number of bytes written by this call. The reader is left
    /// just after the final block, which may be mid-byte.
    pub fn inflate<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        output: &mut W,
    ) -> Result<u64> {
        let start = self.total_out;
        loop {
            let is_final = self.inflate_block(reader, output)?;
            self.flush(output)?;
            if is_final {
                break;
            }
        }
        Ok(self.total_out - start)
    }

    /// Decode one block; returns its final flag.
    fn inflate_block<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        output: &mut W,
    ) -> Result<bool> {
        let is_final = reader.get_single_bit()?;
        let btype = reader.get_bits(2, BitOrder::LowBitFirst)? as u8;
        if reader.eof() {
            return Err(FlatGzError::truncated(reader.bit_position(), "block header"));
        }

        let block_type = BlockType::from_btype(btype).ok_or_else(|| {
            FlatGzError::malformed_block_header(reader.bit_position(), "reserved block type 3")
        })?;
        let before = self.total_out + self.pending.len() as u64;

        match block_type {
            BlockType::Stored => self.inflate_stored(reader, output)?,
            BlockType::Fixed => {
                self.inflate_codes(reader, output, fixed_litlen_tree()?, fixed_distance_tree()?)?
            }
            BlockType::Dynamic => self.inflate_dynamic(reader, output)?,
        }

        self.blocks_read += 1;
        debug!(
            "{} block: {} bytes, final={}",
            block_type,
            self.total_out + self.pending.len() as u64 - before,
            is_final
        );
        Ok(is_final)
    }

    fn inflate_stored<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        output: &mut W,
    ) -> Result<()> {
        reader.align_to_byte();

        let len = reader.get_bits(16, BitOrder::LowBitFirst)? as u16;
        let nlen = reader.get_bits(16, BitOrder::LowBitFirst)? as u16;
        if reader.eof() {
            return Err(FlatGzError::truncated(
                reader.bit_position(),
                "stored block length",
            ));
        }
        if len != !nlen {
            return Err(FlatGzError::malformed_block_header(
                reader.bit_position(),
                format!("LEN {:#06x} does not match NLEN {:#06x}", len, nlen),
            ));
        }

        for _ in 0..len {
            let byte = reader.get_byte()?;
            self.emit(byte);
            if self.pending.len() >= FLUSH_THRESHOLD {
                self.flush(output)?;
            }
        }
        if reader.eof() {
            return Err(FlatGzError::truncated(
                reader.bit_position(),
                "stored block data",
            ));
        }

        Ok(())
    }

    fn inflate_dynamic<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        output: &mut W,
    ) -> Result<()> {
        let hlit = reader.get_bits(5, BitOrder::LowBitFirst)? as usize + 257;
        let hdist = reader.get_bits(5, BitOrder::LowBitFirst)? as usize + 1;
        let hclen = reader.get_bits(4, BitOrder::LowBitFirst)? as usize + 4;

        let mut code_length_lengths = [0u8; NUM_CODE_LENGTH_SYMBOLS];
        for &symbol in &CODE_LENGTH_ORDER[..hclen] {
            code_length_lengths[symbol] = reader.get_bits(3, BitOrder::LowBitFirst)? as u8;
        }
        if reader.eof() {
            return Err(FlatGzError::truncated(
                reader.bit_position(),
                "dynamic block header",
            ));
        }
        trace!("dynamic header: hlit={} hdist={} hclen={}", hlit, hdist, hclen);

        let code_length_tree = HuffmanTree::from_code_lengths(&code_length_lengths)?;
        let lengths = read_code_lengths(reader, &code_length_tree, hlit + hdist)?;

        let (litlen_lengths, distance_lengths) = lengths.split_at(hlit);
        if litlen_lengths[END_OF_BLOCK as usize] == 0 {
            return Err(FlatGzError::malformed_code_table(
                "end-of-block symbol has no code",
            ));
        }

        let litlen_tree = HuffmanTree::from_code_lengths(litlen_lengths)?;
        let distance_tree = HuffmanTree::from_code_lengths(distance_lengths)?;
        self.inflate_codes(reader, output, &litlen_tree, &distance_tree)
    }

    /// Decode literal/length and distance symbols up to end-of-block.
    fn inflate_codes<R: Read, W: Write>(
        &mut self,
        reader: &mut BitReader<R>,
        output: &mut W,
        litlen_tree: &HuffmanTree,
        distance_tree: &HuffmanTree,
    ) -> Result<()> {
        loop {
            let symbol = litlen_tree.decode(reader)?;

            if symbol < 256 {
                self.emit(symbol as u8);
            } else if symbol == END_OF_BLOCK {
                return Ok(());
            } else {
                let (extra_bits, base) = length_code_info(symbol).ok_or_else(|| {
                    FlatGzError::decoding_failure(
                        reader.bit_position(),
                        format!("invalid length symbol {}", symbol),
                    )
                })?;
                let length = base as usize + read_extra(reader, extra_bits)?;

                let code = distance_tree.decode(reader)?;
                let (extra_bits, base) = distance_code_info(code).ok_or_else(|| {
                    FlatGzError::decoding_failure(
                        reader.bit_position(),
                        format!("invalid distance symbol {}", code),
                    )
                })?;
                let distance = base as usize + read_extra(reader, extra_bits)?;

                self.window.copy_match(distance, length, &mut self.pending)?;
            }

            if self.pending.len() >= FLUSH_THRESHOLD {
                self.flush(output)?;
            }
        }
    }

    #[inline]
    fn emit(&mut self, byte: u8) {
        self.window.push(byte);
        self.pending.push(byte);
    }

    fn flush<W: Write>(&mut self, output: &mut W) -> Result<()> {
        if !self.pending.is_empty() {
            output.write_all(&self.pending)?;
            self.total_out += self.pending.len() as u64;
            self.pending.clear();
        }
        Ok(())
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

fn read_extra<R: Read>(reader: &mut BitReader<R>, count: u8) -> Result<usize> {
    if count == 0 {
        return Ok(0);
    }
    let value = reader.get_bits(count, BitOrder::LowBitFirst)? as usize;
    if reader.eof() {
        return Err(FlatGzError::truncated(reader.bit_position(), "extra bits"));
    }
    Ok(value)
}

/// Read `count` literal/length and distance code lengths, expanding the
/// repeat symbols 16, 17 and 18.
fn read_code_lengths<R: Read>(
    reader: &mut BitReader<R>,
    tree: &HuffmanTree,
    count: usize,
) -> Result<Vec<u8>> {
    let mut lengths = Vec::with_capacity(count);

    while lengths.len() < count {
        let symbol = tree.decode(reader)?;
        let (value, repeat) = match symbol {
            0..=15 => (symbol as u8, 1),
            16 => {
                let previous = *lengths.last().ok_or_else(|| {
                    FlatGzError::malformed_code_table("repeat with no previous code length")
                })?;
                (previous, 3 + read_extra(reader, 2)?)
            }
            17 => (0, 3 + read_extra(reader, 3)?),
            18 => (0, 11 + read_extra(reader, 7)?),
            _ => {
                return Err(FlatGzError::decoding_failure(
                    reader.bit_position(),
                    format!("invalid code length symbol {}", symbol),
                ));
            }
        };

        if lengths.len() + repeat > count {
            return Err(FlatGzError::malformed_code_table(format!(
                "code length run of {} overflows {} entries",
                repeat, count
            )));
        }
        lengths.extend(std::iter::repeat_n(value, repeat));
    }

    Ok(lengths)
}

/// Decompress a raw DEFLATE stream held in memory.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);
    let mut output = Vec::new();
    Inflater::new().inflate(&mut reader, &mut output)?;
    Ok(output)
}
