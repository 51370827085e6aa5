//! Static DEFLATE tables (RFC 1951 Sections 3.2.5-3.2.7).
//!
//! Lengths and distances are sent as a base code plus extra bits. The
//! lookups here map a value to its `(code, extra bit count, offset)` triple
//! and back, and provide the fixed Huffman code lengths.

use crate::tree::HuffmanTree;
use flatgz_core::error::Result;
use std::sync::OnceLock;

/// End-of-block marker in the literal/length alphabet.
pub const END_OF_BLOCK: u16 = 256;

/// Literal/length symbols a dynamic block may use (0-285).
pub const NUM_LITLEN_SYMBOLS: usize = 286;

/// Distance symbols a dynamic block may use (0-29).
pub const NUM_DISTANCE_SYMBOLS: usize = 30;

/// Symbols in the code length alphabet.
pub const NUM_CODE_LENGTH_SYMBOLS: usize = 19;

/// Longest code allowed for the literal/length and distance alphabets.
pub const MAX_CODE_LENGTH: u8 = 15;

/// Longest code allowed for the code length alphabet.
pub const MAX_CODE_LENGTH_CODE_LENGTH: u8 = 7;

/// Shortest and longest back-reference length.
pub const MIN_MATCH: usize = 3;
/// See [`MIN_MATCH`].
pub const MAX_MATCH: usize = 258;

/// Largest back-reference distance.
pub const MAX_DISTANCE: usize = 32768;

/// Length code base values for codes 257-285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264
    11, 13, 15, 17, // 265-268
    19, 23, 27, 31, // 269-272
    35, 43, 51, 59, // 273-276
    67, 83, 99, 115, // 277-280
    131, 163, 195, 227, // 281-284
    258, // 285
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values for codes 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Transmission order of the code length code lengths in a dynamic header.
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Map a length (3-258) to `(code, extra bit count, offset)`.
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    debug_assert!(
        (3..=258).contains(&length),
        "Length out of range: {}",
        length
    );

    let length = length as usize;
    let code = match length {
        3..=10 => length - 3 + 257,
        11..=18 => (length - 11) / 2 + 265,
        19..=34 => (length - 19) / 4 + 269,
        35..=66 => (length - 35) / 8 + 273,
        67..=130 => (length - 67) / 16 + 277,
        131..=257 => (length - 131) / 32 + 281,
        _ => 285,
    };

    let index = code - 257;
    let offset = (length - LENGTH_BASE[index] as usize) as u16;
    (code as u16, LENGTH_EXTRA_BITS[index], offset)
}

/// Map a distance (1-32768) to `(code, extra bit count, offset)`.
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(
        (1..=32768).contains(&distance),
        "Distance out of range: {}",
        distance
    );

    // Largest code whose base does not exceed the distance.
    let code = DISTANCE_BASE.partition_point(|&base| base <= distance) - 1;
    (
        code as u16,
        DISTANCE_EXTRA_BITS[code],
        distance - DISTANCE_BASE[code],
    )
}

/// Extra bit count and base for a length code, or `None` for codes outside 257-285.
pub fn length_code_info(code: u16) -> Option<(u8, u16)> {
    let index = code.checked_sub(257)? as usize;
    Some((*LENGTH_EXTRA_BITS.get(index)?, LENGTH_BASE[index]))
}

/// Extra bit count and base for a distance code, or `None` for codes 30 and 31.
pub fn distance_code_info(code: u16) -> Option<(u8, u16)> {
    let index = code as usize;
    Some((*DISTANCE_EXTRA_BITS.get(index)?, DISTANCE_BASE[index]))
}

/// Fixed literal/length code lengths.
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [8u8; 288];
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths
}

/// Fixed distance code lengths: all 32 entries use 5 bits.
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

/// The fixed literal/length decode tree, built once.
pub fn fixed_litlen_tree() -> Result<&'static HuffmanTree> {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    if let Some(tree) = TREE.get() {
        return Ok(tree);
    }
    let tree = HuffmanTree::from_code_lengths(&fixed_litlen_lengths())?;
    Ok(TREE.get_or_init(|| tree))
}

/// The fixed distance decode tree, built once.
pub fn fixed_distance_tree() -> Result<&'static HuffmanTree> {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    if let Some(tree) = TREE.get() {
        return Ok(tree);
    }
    let tree = HuffmanTree::from_code_lengths(&fixed_distance_lengths())?;
    Ok(TREE.get_or_init(|| tree))
}
