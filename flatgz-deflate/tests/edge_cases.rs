//! Edge case tests for DEFLATE compression.

use flatgz_core::FlatGzError;
use flatgz_deflate::{BlockType, DeflateConfig, deflate, inflate};
use proptest::prelude::*;

const ALL_CONFIGS: [DeflateConfig; 3] = [
    DeflateConfig::STORED,
    DeflateConfig::FIXED,
    DeflateConfig::DYNAMIC,
];

fn roundtrip(input: &[u8], config: &DeflateConfig) -> Vec<u8> {
    let compressed = deflate(input, config).unwrap();
    inflate(&compressed).unwrap()
}

#[test]
fn test_empty_input() {
    for config in &ALL_CONFIGS {
        assert!(roundtrip(b"", config).is_empty());
    }
}

#[test]
fn test_single_byte() {
    for config in &ALL_CONFIGS {
        assert_eq!(roundtrip(b"A", config), b"A");
    }
}

#[test]
fn test_all_same_byte() {
    let input = vec![255u8; 5000];
    for config in &ALL_CONFIGS {
        assert_eq!(roundtrip(&input, config), input);
    }

    let compressed = deflate(&input, &DeflateConfig::FIXED).unwrap();
    assert!(compressed.len() < input.len() / 20);
}

#[test]
fn test_max_match_length() {
    let input = vec![42u8; 258 * 10 + 1];
    for config in &ALL_CONFIGS {
        assert_eq!(roundtrip(&input, config), input);
    }
}

#[test]
fn test_non_repeating_input() {
    let input: Vec<u8> = (0..=255u8).collect();
    for config in &ALL_CONFIGS {
        assert_eq!(roundtrip(&input, config), input);
    }
}

#[test]
fn test_multi_block_input() {
    // Three chunks; back-references cross the chunk boundaries.
    let mut input = Vec::with_capacity(200_000);
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    while input.len() < 200_000 {
        input.extend_from_slice(pattern);
    }

    for config in &ALL_CONFIGS {
        assert_eq!(roundtrip(&input, config), input, "{}", config.block_type);
    }

    let fixed = deflate(&input, &DeflateConfig::FIXED).unwrap();
    assert!(fixed.len() < input.len() / 10);
}

#[test]
fn test_dynamic_with_all_literal_symbols() {
    // Enough distinct literals and lengths to push code lengths toward 15.
    let mut input = Vec::new();
    let mut seed: u32 = 12345;
    for i in 0..50_000u32 {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        let skewed = ((seed >> 16) % 256) as u8 & ((i % 8) as u8 * 32 + 31);
        input.push(skewed);
    }
    assert_eq!(roundtrip(&input, &DeflateConfig::DYNAMIC), input);
}

#[test]
fn test_chain_length_setting() {
    let input = b"abcabcabdabcabcabeabcabcabf".repeat(100);
    for chain in [1, 2, 64] {
        let config = DeflateConfig::new(BlockType::Dynamic).with_max_chain_length(chain);
        assert_eq!(roundtrip(&input, &config), input);
    }
}

#[test]
fn test_stored_len_nlen_mismatch() {
    let mut compressed = deflate(b"hello", &DeflateConfig::STORED).unwrap();
    compressed[3] ^= 0x01; // corrupt NLEN
    assert!(matches!(
        inflate(&compressed),
        Err(FlatGzError::MalformedBlockHeader { .. })
    ));
}

#[test]
fn test_back_reference_beyond_history() {
    // Fixed block whose first symbol is length 3 (code 257, 7 bits 0000001)
    // with distance 1 (code 0, 5 bits 00000): nothing to copy from yet.
    //
    // Bits in order: 1 (final), 1 0 (BTYPE=01), 0000001, 00000
    let mut bits = vec![1u8, 1, 0];
    bits.extend([0, 0, 0, 0, 0, 0, 1]);
    bits.extend([0, 0, 0, 0, 0]);
    let mut data = vec![0u8; bits.len().div_ceil(8) + 1];
    for (i, bit) in bits.iter().enumerate() {
        data[i / 8] |= bit << (i % 8);
    }

    assert!(matches!(
        inflate(&data),
        Err(FlatGzError::InvalidBackReference {
            distance: 1,
            history_size: 0
        })
    ));
}

#[test]
fn test_truncated_stream() {
    let input = b"Some text that compresses into more than a few bytes of output".repeat(4);
    for config in &ALL_CONFIGS {
        let compressed = deflate(&input, config).unwrap();
        let cut = &compressed[..compressed.len() / 2];
        assert!(
            matches!(inflate(cut), Err(FlatGzError::TruncatedStream { .. })),
            "{} stream cut in half should be truncated",
            config.block_type
        );
    }
}

#[test]
fn test_block_types_differ_on_the_wire() {
    let input = b"hello hello hello hello";
    let btypes: Vec<u8> = ALL_CONFIGS
        .iter()
        .map(|config| (deflate(input, config).unwrap()[0] >> 1) & 0b11)
        .collect();
    assert_eq!(btypes, vec![0, 1, 2]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_roundtrip_any_input(
        input in proptest::collection::vec(any::<u8>(), 0..4096),
        block_type in prop_oneof![
            Just(BlockType::Stored),
            Just(BlockType::Fixed),
            Just(BlockType::Dynamic),
        ],
    ) {
        let config = DeflateConfig::new(block_type);
        prop_assert_eq!(roundtrip(&input, &config), input);
    }

    #[test]
    fn test_roundtrip_low_entropy(
        input in proptest::collection::vec(0u8..3, 0..8192),
    ) {
        prop_assert_eq!(roundtrip(&input, &DeflateConfig::DYNAMIC), input.clone());
        prop_assert_eq!(roundtrip(&input, &DeflateConfig::FIXED), input);
    }
}
