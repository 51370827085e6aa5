//! # flatgz core
//!
//! Building blocks shared by the flatgz codec and container crates:
//!
//! - [`bitstream`]: Bit-level I/O with selectable value bit order
//! - [`window`]: 32 KB history window for resolving back-references
//! - [`crc`]: The pluggable trailer checksum and CRC-32
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     flatgz compress / decompress / info                 │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     gzip header, block chunking, trailer                │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZSS matcher, package-merge Huffman, DEFLATE blocks │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, HistoryWindow, CRC             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use flatgz_core::bitstream::{BitOrder, BitReader};
//! use flatgz_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.get_bits(12, BitOrder::LowBitFirst).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitstream::{BitOrder, BitReader, BitWriter};
pub use crc::{Checksum, Crc32, ZeroChecksum};
pub use error::{FlatGzError, Result};
pub use window::{DEFLATE_WINDOW_SIZE, HistoryWindow};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitOrder, BitReader, BitWriter};
    pub use crate::crc::{Checksum, Crc32};
    pub use crate::error::{FlatGzError, Result};
    pub use crate::window::HistoryWindow;
}
