//! # flatgz deflate
//!
//! DEFLATE (RFC 1951) compression and decompression.
//!
//! ## Features
//!
//! - **Decompression**: all three block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - **Compression**: LZSS matching plus any one block type per stream
//!   - Dynamic codes are length-limited with package-merge
//!
//! ## Example
//!
//! ```rust
//! use flatgz_deflate::{DeflateConfig, deflate, inflate};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = deflate(original, &DeflateConfig::DYNAMIC).unwrap();
//!
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod deflate;
pub mod huffman;
pub mod inflate;
pub mod lzss;
pub mod tables;
pub mod tree;

// Re-exports
pub use config::{BlockType, DeflateConfig};
pub use deflate::{CHUNK_SIZE, Deflater, deflate};
pub use huffman::{HuffmanBuilder, PrefixCode};
pub use inflate::{Inflater, inflate};
pub use lzss::{LzssEncoder, Symbol, SymbolList};
pub use tree::HuffmanTree;
