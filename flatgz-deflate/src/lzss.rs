//! LZSS match finding for DEFLATE compression.
//!
//! The encoder scans its input left to right. At each position it looks up
//! the three upcoming bytes in a [`StringTable`] of earlier positions and
//! takes the first (most recent) one that shares at least three bytes with
//! the input. A hit becomes a [`Symbol::Length`] followed by a
//! [`Symbol::Distance`]; a miss becomes a [`Symbol::Literal`].
//!
//! Only the position a symbol starts at is entered into the table; the bytes
//! covered by a back-reference are skipped.
//!
//! ```
//! use flatgz_deflate::lzss::LzssEncoder;
//!
//! let mut encoder = LzssEncoder::new();
//! let symbols = encoder.encode(b"banana");
//! assert_eq!(symbols.to_string(), "ban<3:2>");
//! ```

use crate::tables::{
    END_OF_BLOCK, MAX_DISTANCE, MAX_MATCH, MIN_MATCH, distance_to_code, length_to_code,
};
use std::collections::VecDeque;
use std::fmt;

/// Number of hash buckets in the string table.
pub const NUM_BUCKETS: usize = 65536;

/// Default number of positions remembered per bucket.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 10;

/// One element of an LZSS symbol sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A byte copied through unchanged.
    Literal(u8),
    /// Back-reference length (3-258). Always followed by a `Distance`.
    Length(u16),
    /// Back-reference distance (1-32768).
    Distance(u16),
    /// End of the current block (literal/length symbol 256).
    EndOfBlock,
}

impl Symbol {
    /// Code in the literal/length alphabet, or in the distance alphabet for
    /// `Distance`.
    pub fn code(&self) -> u16 {
        match *self {
            Symbol::Literal(byte) => byte as u16,
            Symbol::Length(length) => length_to_code(length).0,
            Symbol::Distance(distance) => distance_to_code(distance).0,
            Symbol::EndOfBlock => END_OF_BLOCK,
        }
    }

    /// Number of extra bits following the code. Zero for literals.
    pub fn extra_bits(&self) -> u8 {
        match *self {
            Symbol::Length(length) => length_to_code(length).1,
            Symbol::Distance(distance) => distance_to_code(distance).1,
            Symbol::Literal(_) | Symbol::EndOfBlock => 0,
        }
    }

    /// Value carried in the extra bits.
    pub fn offset(&self) -> u16 {
        match *self {
            Symbol::Length(length) => length_to_code(length).2,
            Symbol::Distance(distance) => distance_to_code(distance).2,
            Symbol::Literal(_) | Symbol::EndOfBlock => 0,
        }
    }

    /// Whether this symbol is coded with the distance alphabet.
    pub fn is_distance(&self) -> bool {
        matches!(self, Symbol::Distance(_))
    }
}

/// Ordered symbols for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolList {
    symbols: Vec<Symbol>,
}

impl SymbolList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol.
    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the list holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over the symbols in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// The symbols as a slice.
    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl<'a> IntoIterator for &'a SymbolList {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

/// Literals print as characters, back-references as `<length:distance>`.
impl fmt::Display for SymbolList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            match *symbol {
                Symbol::Literal(byte) => write!(f, "{}", byte as char)?,
                Symbol::Length(length) => write!(f, "<{}:", length)?,
                Symbol::Distance(distance) => write!(f, "{}>", distance)?,
                Symbol::EndOfBlock => {}
            }
        }
        Ok(())
    }
}

/// Hash buckets of earlier positions, keyed on their first three bytes.
///
/// Each bucket lists positions most recent first and holds at most
/// `max_chain_length` of them; inserting into a full bucket drops the oldest.
#[derive(Debug, Clone)]
pub struct StringTable {
    buckets: Vec<VecDeque<u64>>,
    max_chain_length: usize,
}

impl StringTable {
    /// Create a table with the given per-bucket limit.
    pub fn new(max_chain_length: usize) -> Self {
        Self {
            buckets: vec![VecDeque::new(); NUM_BUCKETS],
            max_chain_length: max_chain_length.max(1),
        }
    }

    #[inline]
    fn bucket_index(key: &[u8]) -> usize {
        let packed = ((key[0] as u32) << 16) | ((key[1] as u32) << 8) | key[2] as u32;
        (packed.wrapping_mul(2654435761) >> 16) as usize & (NUM_BUCKETS - 1)
    }

    /// Record that the string starting with `key` occurs at `position`.
    pub fn insert(&mut self, key: &[u8], position: u64) {
        let chain = &mut self.buckets[Self::bucket_index(key)];
        chain.push_front(position);
        if chain.len() > self.max_chain_length {
            chain.pop_back();
        }
    }

    /// Candidate positions for `key`, most recent first.
    pub fn candidates(&self, key: &[u8]) -> impl Iterator<Item = u64> + '_ {
        self.buckets[Self::bucket_index(key)].iter().copied()
    }

    /// Mean number of positions per bucket, for diagnostics.
    pub fn average_chain_length(&self) -> f64 {
        let total: usize = self.buckets.iter().map(VecDeque::len).sum();
        total as f64 / NUM_BUCKETS as f64
    }

    /// Forget every position.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(VecDeque::clear);
    }
}

/// LZSS encoder that turns bytes into a [`SymbolList`].
///
/// One encoder serves a whole stream: positions keep counting across calls
/// to [`LzssEncoder::encode`], and the last 32 KB of earlier input stays
/// available for matches.
#[derive(Debug, Clone)]
pub struct LzssEncoder {
    table: StringTable,
    /// Tail of earlier input followed by the chunk being encoded.
    history: Vec<u8>,
    /// Stream position of `history[0]`.
    history_start: u64,
}

impl LzssEncoder {
    /// Create an encoder with the default chain length.
    pub fn new() -> Self {
        Self::with_chain_length(DEFAULT_MAX_CHAIN_LENGTH)
    }

    /// Create an encoder remembering up to `max_chain_length` positions per bucket.
    pub fn with_chain_length(max_chain_length: usize) -> Self {
        Self {
            table: StringTable::new(max_chain_length),
            history: Vec::new(),
            history_start: 0,
        }
    }

    /// The string table, for diagnostics.
    pub fn string_table(&self) -> &StringTable {
        &self.table
    }

    /// Stream position just past everything encoded so far.
    pub fn position(&self) -> u64 {
        self.history_start + self.history.len() as u64
    }

    /// Forget all earlier input.
    pub fn reset(&mut self) {
        self.table.clear();
        self.history.clear();
        self.history_start = 0;
    }

    /// Encode the next chunk of the stream.
    pub fn encode(&mut self, input: &[u8]) -> SymbolList {
        let mut symbols = SymbolList::new();
        let chunk_start = self.history.len();
        self.history.extend_from_slice(input);

        let end = self.history.len();
        let mut pos = chunk_start;
        while pos < end {
            let lookahead = (end - pos).min(MAX_MATCH);
            let global = self.history_start + pos as u64;

            let back_ref = if lookahead >= MIN_MATCH {
                let found = self.find_match(pos, lookahead);
                self.table.insert(&self.history[pos..pos + MIN_MATCH], global);
                found
            } else {
                None
            };

            match back_ref {
                Some((length, distance)) => {
                    symbols.push(Symbol::Length(length as u16));
                    symbols.push(Symbol::Distance(distance as u16));
                    pos += length;
                }
                None => {
                    symbols.push(Symbol::Literal(self.history[pos]));
                    pos += 1;
                }
            }
        }

        self.trim_history();
        symbols
    }

    /// First candidate sharing at least three bytes with `history[pos..]`.
    fn find_match(&self, pos: usize, lookahead: usize) -> Option<(usize, usize)> {
        let global = self.history_start + pos as u64;
        let upcoming = &self.history[pos..pos + lookahead];

        for candidate in self.table.candidates(&upcoming[..MIN_MATCH]) {
            let distance = (global - candidate) as usize;
            // Chains are most recent first, so everything after is older still.
            if candidate < self.history_start || distance > MAX_DISTANCE {
                break;
            }

            let start = (candidate - self.history_start) as usize;
            let length = upcoming
                .iter()
                .zip(&self.history[start..])
                .take_while(|(a, b)| a == b)
                .count();

            if length >= MIN_MATCH {
                return Some((length, distance));
            }
        }

        None
    }

    fn trim_history(&mut self) {
        if self.history.len() > MAX_DISTANCE {
            let excess = self.history.len() - MAX_DISTANCE;
            self.history.drain(..excess);
            self.history_start += excess as u64;
        }
    }
}

impl Default for LzssEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_str(input: &str) -> String {
        LzssEncoder::new().encode(input.as_bytes()).to_string()
    }

    /// Rebuild the input from a symbol list.
    fn expand(symbols: &SymbolList, history: &mut Vec<u8>) {
        let mut pending_length = None;
        for symbol in symbols {
            match *symbol {
                Symbol::Literal(byte) => history.push(byte),
                Symbol::Length(length) => pending_length = Some(length as usize),
                Symbol::Distance(distance) => {
                    let length = pending_length.take().unwrap();
                    let start = history.len() - distance as usize;
                    for i in 0..length {
                        let byte = history[start + i];
                        history.push(byte);
                    }
                }
                Symbol::EndOfBlock => {}
            }
        }
    }

    #[test]
    fn test_encode_known_inputs() {
        assert_eq!(encode_str(""), "");
        assert_eq!(encode_str("abcdef"), "abcdef");
        assert_eq!(encode_str("banana"), "ban<3:2>");
        assert_eq!(encode_str("aaaaaa"), "a<5:1>");
        assert_eq!(encode_str("ababab"), "ab<4:2>");
        assert_eq!(
            encode_str("a lass; a lad; a salad; alaska"),
            "a lass; <4:8>d<4:7>sala<4:9><3:23>ka"
        );
    }

    #[test]
    fn test_banana_symbols() {
        let symbols = LzssEncoder::new().encode(b"banana");
        assert_eq!(
            symbols.as_slice(),
            &[
                Symbol::Literal(b'b'),
                Symbol::Literal(b'a'),
                Symbol::Literal(b'n'),
                Symbol::Length(3),
                Symbol::Distance(2),
            ]
        );
    }

    #[test]
    fn test_symbol_codes() {
        assert_eq!(Symbol::Literal(b'A').code(), 65);
        assert_eq!(Symbol::Literal(b'A').extra_bits(), 0);
        assert_eq!(Symbol::EndOfBlock.code(), 256);

        let length = Symbol::Length(3);
        assert_eq!((length.code(), length.extra_bits(), length.offset()), (257, 0, 0));
        let length = Symbol::Length(258);
        assert_eq!((length.code(), length.extra_bits(), length.offset()), (285, 0, 0));
        let length = Symbol::Length(20);
        assert_eq!((length.code(), length.extra_bits(), length.offset()), (269, 2, 1));

        let distance = Symbol::Distance(7);
        assert_eq!(
            (distance.code(), distance.extra_bits(), distance.offset()),
            (5, 1, 0)
        );
    }

    #[test]
    fn test_long_run_is_capped() {
        let input = vec![b'x'; 1000];
        let symbols = LzssEncoder::new().encode(&input);

        let lengths: Vec<u16> = symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Length(l) => Some(*l),
                _ => None,
            })
            .collect();
        assert!(lengths.iter().all(|&l| l as usize <= MAX_MATCH));
        assert_eq!(lengths[0], 258);
    }

    #[test]
    fn test_matches_across_chunks() {
        let mut encoder = LzssEncoder::new();
        let first = encoder.encode(b"hello world");
        let second = encoder.encode(b"hello world");

        assert_eq!(first.to_string(), "hello world");
        assert_eq!(second.to_string(), "<11:11>");
        assert_eq!(encoder.position(), 22);
    }

    #[test]
    fn test_far_history_is_dropped() {
        let mut encoder = LzssEncoder::new();
        encoder.encode(b"needle");
        encoder.encode(&vec![0u8; MAX_DISTANCE + 10]);

        let symbols = encoder.encode(b"needle");
        assert_eq!(symbols.to_string(), "needle");
    }

    #[test]
    fn test_chain_length_bound() {
        let mut table = StringTable::new(2);
        table.insert(b"abc", 1);
        table.insert(b"abc", 2);
        table.insert(b"abc", 3);
        assert_eq!(table.candidates(b"abc").collect::<Vec<_>>(), vec![3, 2]);
    }

    proptest! {
        #[test]
        fn test_symbols_reproduce_input(
            chunks in proptest::collection::vec(
                proptest::collection::vec(0u8..4, 0..600), 1..4)
        ) {
            let mut encoder = LzssEncoder::with_chain_length(4);
            let mut rebuilt = Vec::new();
            for chunk in &chunks {
                let symbols = encoder.encode(chunk);
                for symbol in &symbols {
                    match *symbol {
                        Symbol::Length(l) => prop_assert!((3..=258).contains(&l)),
                        Symbol::Distance(d) => prop_assert!((1..=32768).contains(&d)),
                        _ => {}
                    }
                }
                expand(&symbols, &mut rebuilt);
            }
            prop_assert_eq!(rebuilt, chunks.concat());
        }
    }
}
