//! Prefix code decoding.
//!
//! [`HuffmanTree`] is a binary trie held in an index arena. It is built from
//! a code length table by re-deriving the canonical codes, then walked one
//! bit at a time: 0 goes left, 1 goes right, and a leaf yields its symbol.

use crate::huffman::canonical_codes_wide;
use crate::tables::MAX_CODE_LENGTH;
use flatgz_core::bitstream::BitReader;
use flatgz_core::error::{FlatGzError, Result};
use std::io::Read;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    /// Child reached on bit 0 and on bit 1.
    children: [Option<usize>; 2],
    symbol: Option<u16>,
}

/// Decoding trie for one prefix code.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
}

impl HuffmanTree {
    /// Build a tree from `code_lengths[symbol]` (0 = symbol unused).
    ///
    /// Tables whose codes collide are rejected with `MalformedCodeTable`.
    /// Incomplete tables are accepted; the missing codes fail at decode time.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        if let Some(&len) = code_lengths.iter().find(|&&len| len > MAX_CODE_LENGTH) {
            return Err(FlatGzError::malformed_code_table(format!(
                "code length {} exceeds maximum {}",
                len, MAX_CODE_LENGTH
            )));
        }

        let codes = canonical_codes_wide(code_lengths);
        let mut nodes = vec![Node::default()];

        for (symbol, (&len, &code)) in code_lengths.iter().zip(&codes).enumerate() {
            if len == 0 {
                continue;
            }
            // An unused length means the counts overflowed the code space.
            if code >> len != 0 {
                return Err(FlatGzError::malformed_code_table("over-subscribed code lengths"));
            }

            let mut current = ROOT;
            for bit in (0..len).rev() {
                if nodes[current].symbol.is_some() {
                    return Err(collision(symbol));
                }
                let branch = ((code >> bit) & 1) as usize;
                current = match nodes[current].children[branch] {
                    Some(child) => child,
                    None => {
                        nodes.push(Node::default());
                        let child = nodes.len() - 1;
                        nodes[current].children[branch] = Some(child);
                        child
                    }
                };
            }

            let leaf = &mut nodes[current];
            if leaf.symbol.is_some() || leaf.children.iter().any(Option::is_some) {
                return Err(collision(symbol));
            }
            leaf.symbol = Some(symbol as u16);
        }

        Ok(Self { nodes })
    }

    /// Decode one symbol.
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        let mut current = ROOT;
        loop {
            let node = &self.nodes[current];
            if let Some(symbol) = node.symbol {
                return Ok(symbol);
            }

            let bit = reader.get_single_bit()?;
            if reader.eof() {
                return Err(FlatGzError::truncated(
                    reader.bit_position(),
                    "prefix code",
                ));
            }

            current = node.children[bit as usize].ok_or_else(|| {
                FlatGzError::decoding_failure(reader.bit_position(), "no symbol has this code")
            })?;
        }
    }

    /// Number of trie nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn collision(symbol: usize) -> FlatGzError {
    FlatGzError::malformed_code_table(format!("code for symbol {} collides", symbol))
}
