//! Length-limited prefix code construction for the encoder.
//!
//! [`HuffmanBuilder`] collects symbol frequencies and runs package-merge to
//! get optimal code lengths no longer than a given maximum. The lengths are
//! then turned into canonical codes (RFC 1951 Section 3.2.2), the same
//! derivation the decoder performs in [`crate::tree`].
//!
//! # Alphabets
//!
//! DEFLATE codes three alphabets this way:
//! - **Literal/Length**: 0-285, max length 15
//! - **Distance**: 0-29, max length 15
//! - **Code Length**: 0-18, max length 7

use crate::tables::MAX_CODE_LENGTH;
use log::trace;

/// Code lengths and canonical codes for one alphabet.
///
/// Both vectors are indexed by symbol. A length of 0 marks an unused symbol
/// whose code entry is meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixCode {
    /// Code length per symbol.
    pub lengths: Vec<u8>,
    /// Code bits per symbol, to be sent most significant bit first.
    pub codes: Vec<u16>,
}

impl PrefixCode {
    /// Derive the canonical codes for a code length table.
    pub fn from_lengths(lengths: Vec<u8>) -> Self {
        let codes = canonical_codes(&lengths);
        Self { lengths, codes }
    }

    /// `(code, length)` for `symbol`.
    #[inline]
    pub fn entry(&self, symbol: u16) -> (u16, u8) {
        let index = symbol as usize;
        (self.codes[index], self.lengths[index])
    }

    /// Index one past the last used symbol.
    pub fn used_len(&self) -> usize {
        let unused_tail = self.lengths.iter().rev().take_while(|&&len| len == 0).count();
        self.lengths.len() - unused_tail
    }
}

/// Assign canonical codes to a code length table.
///
/// Shorter codes are numerically smaller, and codes of equal length follow
/// symbol order. Unused symbols (length 0) get code 0.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    canonical_codes_wide(lengths)
        .into_iter()
        .map(|code| code as u16)
        .collect()
}

/// [`canonical_codes`] without truncation, so an over-subscribed table shows
/// up as a code that does not fit in its length.
pub(crate) fn canonical_codes_wide(lengths: &[u8]) -> Vec<u32> {
    let mut length_counts = [0u32; MAX_CODE_LENGTH as usize + 1];
    for &len in lengths {
        debug_assert!(len <= MAX_CODE_LENGTH, "code length {} too large", len);
        length_counts[len as usize] += 1;
    }
    length_counts[0] = 0;

    let mut next_code = [0u32; MAX_CODE_LENGTH as usize + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_CODE_LENGTH as usize {
        code = (code + length_counts[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let code = next_code[len as usize];
            next_code[len as usize] += 1;
            code
        })
        .collect()
}

/// A node of the package-merge arena.
#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { symbol: u16 },
    Package { left: usize, right: usize },
}

/// Frequency counter and code length builder for one alphabet.
#[derive(Debug, Clone)]
pub struct HuffmanBuilder {
    frequencies: Vec<u32>,
    max_length: u8,
}

impl HuffmanBuilder {
    /// Create a builder for `alphabet_size` symbols and codes of at most
    /// `max_length` bits.
    pub fn new(alphabet_size: usize, max_length: u8) -> Self {
        debug_assert!(
            (1..=MAX_CODE_LENGTH).contains(&max_length),
            "max code length must be 1-15, got {}",
            max_length
        );
        Self {
            frequencies: vec![0; alphabet_size],
            max_length,
        }
    }

    /// Count one occurrence of `symbol`.
    pub fn add(&mut self, symbol: u16) {
        self.add_count(symbol, 1);
    }

    /// Count `count` occurrences of `symbol`.
    pub fn add_count(&mut self, symbol: u16, count: u32) {
        self.frequencies[symbol as usize] += count;
    }

    /// Frequencies counted so far, indexed by symbol.
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    /// Build code lengths and canonical codes.
    ///
    /// # Panics
    ///
    /// Panics if more symbols are used than `max_length` bits can address.
    pub fn build(&self) -> PrefixCode {
        PrefixCode::from_lengths(self.build_lengths())
    }

    /// Build code lengths only.
    pub fn build_lengths(&self) -> Vec<u8> {
        let mut lengths = vec![0u8; self.frequencies.len()];

        let mut leaves: Vec<(u64, u16)> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|&(_, &freq)| freq > 0)
            .map(|(symbol, &freq)| (freq as u64, symbol as u16))
            .collect();

        match leaves.len() {
            0 => return lengths,
            1 => {
                lengths[leaves[0].1 as usize] = 1;
                return lengths;
            }
            _ => {}
        }

        let n = leaves.len();
        assert!(
            1usize << self.max_length >= n,
            "{} symbols do not fit in codes of at most {} bits",
            n,
            self.max_length
        );

        leaves.sort_unstable();
        for symbol in package_merge(&leaves, self.max_length) {
            lengths[symbol as usize] += 1;
        }

        trace!(
            "package-merge: {} symbols, max length {}, longest {}",
            n,
            self.max_length,
            lengths.iter().max().copied().unwrap_or(0)
        );
        lengths
    }
}

/// Run package-merge over `leaves` (sorted by weight, then symbol) and
/// return one symbol per leaf occurrence among the selected nodes.
fn package_merge(leaves: &[(u64, u16)], max_length: u8) -> Vec<u16> {
    let mut arena: Vec<Node> = leaves
        .iter()
        .map(|&(_, symbol)| Node::Leaf { symbol })
        .collect();
    // (weight, arena index); leaf i lives at arena index i.
    let singletons: Vec<(u64, usize)> = leaves
        .iter()
        .enumerate()
        .map(|(index, &(weight, _))| (weight, index))
        .collect();

    let mut list = singletons.clone();
    for _ in 1..max_length {
        let packages: Vec<(u64, usize)> = list
            .chunks_exact(2)
            .map(|pair| {
                arena.push(Node::Package {
                    left: pair[0].1,
                    right: pair[1].1,
                });
                (pair[0].0 + pair[1].0, arena.len() - 1)
            })
            .collect();
        list = merge(&packages, &singletons);
    }

    let mut symbols = Vec::new();
    let mut stack: Vec<usize> = list
        .iter()
        .take(2 * leaves.len() - 2)
        .map(|&(_, index)| index)
        .collect();
    while let Some(index) = stack.pop() {
        match arena[index] {
            Node::Leaf { symbol } => symbols.push(symbol),
            Node::Package { left, right } => {
                stack.push(left);
                stack.push(right);
            }
        }
    }
    symbols
}

/// Merge two weight-sorted lists; on equal weight `second` goes first.
fn merge(first: &[(u64, usize)], second: &[(u64, usize)]) -> Vec<(u64, usize)> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    let (mut i, mut j) = (0, 0);

    while i < first.len() && j < second.len() {
        if first[i].0 < second[j].0 {
            merged.push(first[i]);
            i += 1;
        } else {
            merged.push(second[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&first[i..]);
    merged.extend_from_slice(&second[j..]);
    merged
}
