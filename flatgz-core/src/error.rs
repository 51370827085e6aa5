//! Error types for flatgz operations.
//!
//! Every failure a decode or encode can hit is a variant of [`FlatGzError`].
//! None of them are recoverable for the operation that raised them: the
//! caller gets the error and any output produced so far must be discarded.

use std::io;
use thiserror::Error;

/// The main error type for flatgz operations.
#[derive(Debug, Error)]
pub enum FlatGzError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad magic bytes or compression method in the gzip header.
    #[error("Invalid container header: {message}")]
    InvalidContainerHeader {
        /// Description of the header problem.
        message: String,
    },

    /// A DEFLATE block header that cannot be valid (stored LEN/NLEN mismatch,
    /// reserved block type).
    #[error("Malformed block header at bit {bit_position}: {message}")]
    MalformedBlockHeader {
        /// Bit position just after the offending field.
        bit_position: u64,
        /// Description of the block header error.
        message: String,
    },

    /// Back-reference reaching further back than the available history.
    #[error("Invalid back-reference: distance {distance} exceeds history size {history_size}")]
    InvalidBackReference {
        /// The requested distance.
        distance: usize,
        /// Number of bytes currently held in the history window.
        history_size: usize,
    },

    /// Code length table that cannot describe a prefix code.
    #[error("Malformed code table: {message}")]
    MalformedCodeTable {
        /// Description of the table error.
        message: String,
    },

    /// The prefix code walk reached a code that no symbol owns.
    #[error("Decoding failure at bit {bit_position}: {message}")]
    DecodingFailure {
        /// Bit position where decoding failed.
        bit_position: u64,
        /// Description of the failure.
        message: String,
    },

    /// Input ended before the DEFLATE stream was complete.
    #[error("Truncated stream at bit {bit_position}: {context}")]
    TruncatedStream {
        /// Bit position at which the input ran out.
        bit_position: u64,
        /// What was being read when the input ran out.
        context: String,
    },

    /// Trailer checksum does not match the decoded data.
    #[error("Checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the trailer.
        expected: u32,
        /// Checksum of the decoded data.
        computed: u32,
    },

    /// Trailer size does not match the decoded length.
    #[error("Size mismatch: trailer says {expected} bytes, decoded {actual} (mod 2^32)")]
    SizeMismatch {
        /// Size stored in the trailer.
        expected: u32,
        /// Decoded length modulo 2^32.
        actual: u32,
    },
}

/// Result type alias for flatgz operations.
pub type Result<T> = std::result::Result<T, FlatGzError>;

impl FlatGzError {
    /// Create an invalid container header error.
    pub fn invalid_container_header(message: impl Into<String>) -> Self {
        Self::InvalidContainerHeader {
            message: message.into(),
        }
    }

    /// Create a malformed block header error.
    pub fn malformed_block_header(bit_position: u64, message: impl Into<String>) -> Self {
        Self::MalformedBlockHeader {
            bit_position,
            message: message.into(),
        }
    }

    /// Create an invalid back-reference error.
    pub fn invalid_back_reference(distance: usize, history_size: usize) -> Self {
        Self::InvalidBackReference {
            distance,
            history_size,
        }
    }

    /// Create a malformed code table error.
    pub fn malformed_code_table(message: impl Into<String>) -> Self {
        Self::MalformedCodeTable {
            message: message.into(),
        }
    }

    /// Create a decoding failure error.
    pub fn decoding_failure(bit_position: u64, message: impl Into<String>) -> Self {
        Self::DecodingFailure {
            bit_position,
            message: message.into(),
        }
    }

    /// Create a truncated stream error.
    pub fn truncated(bit_position: u64, context: impl Into<String>) -> Self {
        Self::TruncatedStream {
            bit_position,
            context: context.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch { expected, computed }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: u32, actual: u32) -> Self {
        Self::SizeMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlatGzError::invalid_container_header("bad magic 50 4b");
        assert!(err.to_string().contains("Invalid container header"));

        let err = FlatGzError::invalid_back_reference(40, 3);
        assert!(err.to_string().contains("distance 40"));
        assert!(err.to_string().contains("history size 3"));

        let err = FlatGzError::checksum_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("0x12345678"));

        let err = FlatGzError::truncated(17, "block header");
        assert!(err.to_string().contains("block header"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: FlatGzError = io_err.into();
        assert!(matches!(err, FlatGzError::Io(_)));
    }
}
