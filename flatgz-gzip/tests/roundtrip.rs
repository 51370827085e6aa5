//! End-to-end tests for gzip framing.

use flatgz_core::FlatGzError;
use flatgz_core::crc::ZeroChecksum;
use flatgz_deflate::{BlockType, DeflateConfig};
use flatgz_gzip::{GzipHeader, GzipReader, GzipReaderConfig, GzipWriter, compress, decompress};
use proptest::prelude::*;
use std::io::Cursor;

const ALL_CONFIGS: [DeflateConfig; 3] = [
    DeflateConfig::STORED,
    DeflateConfig::FIXED,
    DeflateConfig::DYNAMIC,
];

#[test]
fn test_read_write_functions() {
    let data = b"Hello, GZIP World! This is a test of compression.";

    let mut compressed = Vec::new();
    let size = flatgz_gzip::write(&mut &data[..], &mut compressed).unwrap();
    assert_eq!(size, data.len() as u32);

    let mut decompressed = Vec::new();
    let produced = flatgz_gzip::read(&mut Cursor::new(&compressed), &mut decompressed).unwrap();
    assert_eq!(produced, data.len() as u64);
    assert_eq!(decompressed, data);
}

#[test]
fn test_roundtrip_all_block_types() {
    let inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"x".to_vec(),
        vec![b'A'; 10_000],
        (0..=255u8).cycle().take(70_000).collect(),
        b"abracadabra ".repeat(20_000),
    ];

    for config in ALL_CONFIGS {
        for input in &inputs {
            let compressed = compress(input, config).unwrap();
            assert_eq!(
                &decompress(&compressed).unwrap(),
                input,
                "{} blocks, {} bytes",
                config.block_type,
                input.len()
            );
        }
    }
}

#[test]
fn test_repeated_input_shrinks() {
    let original = vec![b'A'; 10_000];
    for config in [DeflateConfig::FIXED, DeflateConfig::DYNAMIC] {
        let compressed = compress(&original, config).unwrap();
        assert!(compressed.len() < original.len() / 10);
    }
}

#[test]
fn test_bad_magic() {
    let mut file = compress(b"data", DeflateConfig::FIXED).unwrap();
    file[0] = 0x1e;
    assert!(matches!(
        decompress(&file),
        Err(FlatGzError::InvalidContainerHeader { .. })
    ));
}

#[test]
fn test_bad_method() {
    let mut file = compress(b"data", DeflateConfig::FIXED).unwrap();
    file[2] = 0x07;
    assert!(matches!(
        decompress(&file),
        Err(FlatGzError::InvalidContainerHeader { .. })
    ));
}

#[test]
fn test_fname_header_decodes() {
    let original = b"Test data with filename";
    let header = GzipHeader::with_filename("data.txt").comment("hello");
    let compressed = GzipWriter::new(DeflateConfig::DYNAMIC)
        .header(header)
        .compress_to_vec(original)
        .unwrap();

    let mut reader = GzipReader::new(Cursor::new(compressed), GzipReaderConfig::VERIFY).unwrap();
    assert_eq!(reader.header().filename.as_deref(), Some("data.txt"));
    assert_eq!(reader.header().comment.as_deref(), Some("hello"));
    assert_eq!(reader.decompress().unwrap(), original);
}

#[test]
fn test_foreign_file_with_fname() {
    // "hello\n" from zlib at level 9 behind a hand-built FNAME header.
    let file: [u8; 36] = [
        0x1f, 0x8b, 0x08, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, b'h', b'e', b'l', b'l',
        b'o', b'.', b't', b'x', b't', 0x00, 0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0xe7, 0x02, 0x00,
        0x20, 0x30, 0x3a, 0x36, 0x06, 0x00, 0x00, 0x00,
    ];
    let mut reader = GzipReader::new(&file[..], GzipReaderConfig::VERIFY).unwrap();
    assert_eq!(reader.header().filename.as_deref(), Some("hello.txt"));
    assert_eq!(reader.decompress().unwrap(), b"hello\n");
}

#[test]
fn test_checksum_mismatch_verified() {
    let mut file = compress(b"checksum me", DeflateConfig::FIXED).unwrap();
    let crc_at = file.len() - 8;
    file[crc_at] ^= 0xFF;

    assert!(matches!(
        decompress(&file),
        Err(FlatGzError::ChecksumMismatch { .. })
    ));

    // Not verifying: the data still comes out.
    let mut out = Vec::new();
    flatgz_gzip::read(&mut &file[..], &mut out).unwrap();
    assert_eq!(out, b"checksum me");
}

#[test]
fn test_zero_checksum_writer() {
    let mut writer = GzipWriter::with_checksum(DeflateConfig::DYNAMIC, ZeroChecksum);
    let file = writer.compress_to_vec(b"placeholder").unwrap();

    let mut out = Vec::new();
    flatgz_gzip::read(&mut &file[..], &mut out).unwrap();
    assert_eq!(out, b"placeholder");

    assert!(matches!(
        decompress(&file),
        Err(FlatGzError::ChecksumMismatch { expected: 0, .. })
    ));
}

#[test]
fn test_truncated_body() {
    let data = b"Some text that is long enough to need several bytes of codes".repeat(8);
    for config in ALL_CONFIGS {
        let file = compress(&data, config).unwrap();
        let cut = &file[..file.len() / 2];
        let mut out = Vec::new();
        assert!(matches!(
            flatgz_gzip::read(&mut &cut[..], &mut out),
            Err(FlatGzError::TruncatedStream { .. })
        ));
    }
}

#[test]
fn test_header_only_is_truncated() {
    let file = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03];
    let mut out = Vec::new();
    assert!(matches!(
        flatgz_gzip::read(&mut &file[..], &mut out),
        Err(FlatGzError::TruncatedStream { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_roundtrip_any(
        input in proptest::collection::vec(any::<u8>(), 0..10_000),
        chain in 1usize..32,
        block_type in prop_oneof![
            Just(BlockType::Stored),
            Just(BlockType::Fixed),
            Just(BlockType::Dynamic),
        ],
    ) {
        let config = DeflateConfig::new(block_type).with_max_chain_length(chain);
        let compressed = compress(&input, config).unwrap();
        prop_assert_eq!(decompress(&compressed).unwrap(), input);
    }
}
