//! DEFLATE compression.
//!
//! [`Deflater`] writes one block per input chunk, always of the block type
//! chosen in its [`DeflateConfig`]:
//! - Stored blocks (no compression)
//! - Fixed Huffman codes
//! - Dynamic Huffman codes built with package-merge
//!
//! Prefix codes are written most significant bit first; every other field
//! (header bits, extra bits, LEN/NLEN) least significant bit first.

use crate::config::{BlockType, DeflateConfig};
use crate::huffman::{HuffmanBuilder, PrefixCode};
use crate::lzss::{LzssEncoder, Symbol, SymbolList};
use crate::tables::{
    CODE_LENGTH_ORDER, MAX_CODE_LENGTH, MAX_CODE_LENGTH_CODE_LENGTH, NUM_CODE_LENGTH_SYMBOLS,
    NUM_DISTANCE_SYMBOLS, NUM_LITLEN_SYMBOLS, fixed_distance_lengths, fixed_litlen_lengths,
};
use flatgz_core::bitstream::{BitOrder, BitWriter};
use flatgz_core::error::Result;
use log::{debug, trace};
use std::io::Write;

/// Largest chunk a single stored block can carry.
pub const MAX_STORED_BLOCK: usize = 65535;

/// Input chunk size used by [`deflate`] and the gzip writer.
pub const CHUNK_SIZE: usize = 65535;

/// One entry of the run-length encoded code length sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLengthSymbol {
    /// Symbol in the code length alphabet (0-18).
    pub symbol: u8,
    /// Repeat count offset carried in the extra bits (16, 17 and 18 only).
    pub extra: u8,
}

impl CodeLengthSymbol {
    fn literal(length: u8) -> Self {
        Self {
            symbol: length,
            extra: 0,
        }
    }

    /// Number of extra bits after this symbol.
    pub fn extra_bits(&self) -> u8 {
        match self.symbol {
            16 => 2,
            17 => 3,
            18 => 7,
            _ => 0,
        }
    }
}

/// Run-length encode a code length sequence with symbols 0-18.
///
/// - 16: repeat the previous length 3-6 times
/// - 17: 3-10 zeros
/// - 18: 11-138 zeros
pub fn run_length_encode(lengths: &[u8]) -> Vec<CodeLengthSymbol> {
    let mut encoded = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();

        if len == 0 {
            let mut remaining = run;
            while remaining >= 11 {
                let count = remaining.min(138);
                encoded.push(CodeLengthSymbol {
                    symbol: 18,
                    extra: (count - 11) as u8,
                });
                remaining -= count;
            }
            if remaining >= 3 {
                encoded.push(CodeLengthSymbol {
                    symbol: 17,
                    extra: (remaining - 3) as u8,
                });
                remaining = 0;
            }
            encoded.extend((0..remaining).map(|_| CodeLengthSymbol::literal(0)));
        } else {
            encoded.push(CodeLengthSymbol::literal(len));
            let mut remaining = run - 1;
            while remaining >= 3 {
                let count = remaining.min(6);
                encoded.push(CodeLengthSymbol {
                    symbol: 16,
                    extra: (count - 3) as u8,
                });
                remaining -= count;
            }
            encoded.extend((0..remaining).map(|_| CodeLengthSymbol::literal(len)));
        }

        i += run;
    }

    encoded
}

/// DEFLATE compressor.
///
/// The LZSS state carries over between blocks, so back-references may reach
/// into earlier chunks of the same stream.
#[derive(Debug)]
pub struct Deflater {
    config: DeflateConfig,
    lzss: LzssEncoder,
    fixed_litlen: PrefixCode,
    fixed_distance: PrefixCode,
    blocks_written: u64,
}

impl Deflater {
    /// Create a compressor.
    pub fn new(config: DeflateConfig) -> Self {
        Self {
            config,
            lzss: LzssEncoder::with_chain_length(config.max_chain_length),
            fixed_litlen: PrefixCode::from_lengths(fixed_litlen_lengths().to_vec()),
            fixed_distance: PrefixCode::from_lengths(fixed_distance_lengths().to_vec()),
            blocks_written: 0,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &DeflateConfig {
        &self.config
    }

    /// Number of blocks written so far.
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Forget the stream written so far.
    pub fn reset(&mut self) {
        self.lzss.reset();
        self.blocks_written = 0;
    }

    /// Write `chunk` as one block of the configured type.
    ///
    /// Stored chunks longer than [`MAX_STORED_BLOCK`] are split over several
    /// blocks, of which only the last carries the final flag.
    pub fn write_block<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        chunk: &[u8],
        is_last: bool,
    ) -> Result<()> {
        match self.config.block_type {
            BlockType::Stored => self.write_stored(writer, chunk, is_last),
            BlockType::Fixed => {
                let symbols = self.encode_symbols(chunk);
                self.write_fixed(writer, &symbols, is_last)
            }
            BlockType::Dynamic => {
                let symbols = self.encode_symbols(chunk);
                self.write_dynamic(writer, &symbols, is_last)
            }
        }
    }

    fn encode_symbols(&mut self, chunk: &[u8]) -> SymbolList {
        let mut symbols = self.lzss.encode(chunk);
        symbols.push(Symbol::EndOfBlock);
        symbols
    }

    fn write_header<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        block_type: BlockType,
        is_last: bool,
    ) -> Result<()> {
        writer.put_single_bit(is_last)?;
        writer.put_bits(block_type.btype() as u64, 2, BitOrder::LowBitFirst)?;
        self.blocks_written += 1;
        Ok(())
    }

    fn write_stored<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        chunk: &[u8],
        is_last: bool,
    ) -> Result<()> {
        let mut pieces = chunk.chunks(MAX_STORED_BLOCK).peekable();
        if pieces.peek().is_none() {
            return self.write_stored_piece(writer, &[], is_last);
        }
        while let Some(piece) = pieces.next() {
            let last_piece = pieces.peek().is_none();
            self.write_stored_piece(writer, piece, is_last && last_piece)?;
        }
        Ok(())
    }

    fn write_stored_piece<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        piece: &[u8],
        is_last: bool,
    ) -> Result<()> {
        self.write_header(writer, BlockType::Stored, is_last)?;
        writer.pad_to_byte()?;

        let len = piece.len() as u16;
        writer.put_bits(len as u64, 16, BitOrder::LowBitFirst)?;
        writer.put_bits(!len as u64, 16, BitOrder::LowBitFirst)?;
        writer.put_bytes(piece)?;

        debug!("stored block: {} bytes, final={}", piece.len(), is_last);
        Ok(())
    }

    fn write_fixed<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        symbols: &SymbolList,
        is_last: bool,
    ) -> Result<()> {
        self.write_header(writer, BlockType::Fixed, is_last)?;
        let start = writer.bits_written();
        write_symbols(writer, symbols, &self.fixed_litlen, &self.fixed_distance)?;

        debug!(
            "fixed block: {} symbols, {} bits, final={}",
            symbols.len(),
            writer.bits_written() - start,
            is_last
        );
        Ok(())
    }

    fn write_dynamic<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        symbols: &SymbolList,
        is_last: bool,
    ) -> Result<()> {
        let mut litlen_builder = HuffmanBuilder::new(NUM_LITLEN_SYMBOLS, MAX_CODE_LENGTH);
        let mut distance_builder = HuffmanBuilder::new(NUM_DISTANCE_SYMBOLS, MAX_CODE_LENGTH);
        for symbol in symbols {
            if symbol.is_distance() {
                distance_builder.add(symbol.code());
            } else {
                litlen_builder.add(symbol.code());
            }
        }
        let litlen = litlen_builder.build();
        let distance = distance_builder.build();

        let hlit = litlen.used_len().max(257);
        let hdist = distance.used_len().max(1);

        let mut lengths = Vec::with_capacity(hlit + hdist);
        lengths.extend_from_slice(&litlen.lengths[..hlit]);
        lengths.extend_from_slice(&distance.lengths[..hdist]);
        let encoded_lengths = run_length_encode(&lengths);

        let mut code_length_builder =
            HuffmanBuilder::new(NUM_CODE_LENGTH_SYMBOLS, MAX_CODE_LENGTH_CODE_LENGTH);
        for entry in &encoded_lengths {
            code_length_builder.add(entry.symbol as u16);
        }
        let code_length_code = code_length_builder.build();

        let unused_tail = CODE_LENGTH_ORDER
            .iter()
            .rev()
            .take_while(|&&symbol| code_length_code.lengths[symbol] == 0)
            .count();
        let hclen = (NUM_CODE_LENGTH_SYMBOLS - unused_tail).max(4);

        self.write_header(writer, BlockType::Dynamic, is_last)?;
        let start = writer.bits_written();

        writer.put_bits((hlit - 257) as u64, 5, BitOrder::LowBitFirst)?;
        writer.put_bits((hdist - 1) as u64, 5, BitOrder::LowBitFirst)?;
        writer.put_bits((hclen - 4) as u64, 4, BitOrder::LowBitFirst)?;
        for &symbol in &CODE_LENGTH_ORDER[..hclen] {
            writer.put_bits(
                code_length_code.lengths[symbol] as u64,
                3,
                BitOrder::LowBitFirst,
            )?;
        }

        for entry in &encoded_lengths {
            let (code, len) = code_length_code.entry(entry.symbol as u16);
            writer.put_bits(code as u64, len, BitOrder::HighBitFirst)?;
            let extra_bits = entry.extra_bits();
            if extra_bits > 0 {
                writer.put_bits(entry.extra as u64, extra_bits, BitOrder::LowBitFirst)?;
            }
        }

        trace!(
            "dynamic header: hlit={} hdist={} hclen={} rle_symbols={}",
            hlit,
            hdist,
            hclen,
            encoded_lengths.len()
        );
        let header_bits = writer.bits_written() - start;

        write_symbols(writer, symbols, &litlen, &distance)?;

        debug!(
            "dynamic block: {} symbols, {} header bits, {} bits total, final={}",
            symbols.len(),
            header_bits,
            writer.bits_written() - start,
            is_last
        );
        Ok(())
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::new(DeflateConfig::default())
    }
}

/// Write symbols under the given codes, each followed by its extra bits.
fn write_symbols<W: Write>(
    writer: &mut BitWriter<W>,
    symbols: &SymbolList,
    litlen: &PrefixCode,
    distance: &PrefixCode,
) -> Result<()> {
    for symbol in symbols {
        let table = if symbol.is_distance() { distance } else { litlen };
        let (code, len) = table.entry(symbol.code());
        writer.put_bits(code as u64, len, BitOrder::HighBitFirst)?;

        let extra_bits = symbol.extra_bits();
        if extra_bits > 0 {
            writer.put_bits(symbol.offset() as u64, extra_bits, BitOrder::LowBitFirst)?;
        }
    }
    Ok(())
}

/// Compress `data` into a raw DEFLATE stream.
///
/// The input is cut into [`CHUNK_SIZE`] chunks, one block each. Empty input
/// produces a single empty final block.
pub fn deflate(data: &[u8], config: &DeflateConfig) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut writer = BitWriter::new(&mut output);
        let mut deflater = Deflater::new(*config);

        let mut chunks = data.chunks(CHUNK_SIZE).peekable();
        if chunks.peek().is_none() {
            deflater.write_block(&mut writer, &[], true)?;
        }
        while let Some(chunk) = chunks.next() {
            let is_last = chunks.peek().is_none();
            deflater.write_block(&mut writer, chunk, is_last)?;
        }

        writer.finish()?;
    }
    Ok(output)
}
