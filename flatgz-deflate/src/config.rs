//! Compression configuration.

use crate::lzss::DEFAULT_MAX_CHAIN_LENGTH;
use std::fmt;
use std::str::FromStr;

/// The DEFLATE block type written for every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    /// Type 0: raw bytes behind a LEN/NLEN header.
    Stored,
    /// Type 1: LZSS symbols under the fixed prefix codes.
    #[default]
    Fixed,
    /// Type 2: LZSS symbols under codes built from the block's frequencies.
    Dynamic,
}

impl BlockType {
    /// The two-bit BTYPE value.
    pub fn btype(self) -> u8 {
        match self {
            BlockType::Stored => 0,
            BlockType::Fixed => 1,
            BlockType::Dynamic => 2,
        }
    }

    /// Block type for a BTYPE value; `None` for the reserved value 3.
    pub fn from_btype(btype: u8) -> Option<Self> {
        match btype {
            0 => Some(BlockType::Stored),
            1 => Some(BlockType::Fixed),
            2 => Some(BlockType::Dynamic),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Stored => "stored",
            BlockType::Fixed => "fixed",
            BlockType::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stored" | "0" => Ok(BlockType::Stored),
            "fixed" | "1" => Ok(BlockType::Fixed),
            "dynamic" | "2" => Ok(BlockType::Dynamic),
            _ => Err(format!("unknown block type: {}", s)),
        }
    }
}

/// Compressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateConfig {
    /// Block type used for every block.
    pub block_type: BlockType,
    /// Positions remembered per string table bucket.
    pub max_chain_length: usize,
}

impl DeflateConfig {
    /// Stored blocks only; no matching.
    pub const STORED: Self = Self {
        block_type: BlockType::Stored,
        max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
    };

    /// Fixed prefix codes.
    pub const FIXED: Self = Self {
        block_type: BlockType::Fixed,
        max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
    };

    /// Per-block package-merge codes.
    pub const DYNAMIC: Self = Self {
        block_type: BlockType::Dynamic,
        max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
    };

    /// Create a configuration for `block_type` with the default chain length.
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            ..Self::FIXED
        }
    }

    /// Set the block type.
    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    /// Set the string table chain length (at least 1).
    pub fn with_max_chain_length(mut self, max_chain_length: usize) -> Self {
        self.max_chain_length = max_chain_length.max(1);
        self
    }
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self::FIXED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(DeflateConfig::default(), DeflateConfig::FIXED);
        assert_eq!(DeflateConfig::STORED.block_type, BlockType::Stored);
        assert_eq!(DeflateConfig::DYNAMIC.max_chain_length, 10);
    }

    #[test]
    fn test_builders() {
        let config = DeflateConfig::new(BlockType::Dynamic).with_max_chain_length(0);
        assert_eq!(config.block_type, BlockType::Dynamic);
        assert_eq!(config.max_chain_length, 1);
        assert_eq!(
            config.with_block_type(BlockType::Stored).block_type,
            BlockType::Stored
        );
    }

    #[test]
    fn test_btype_mapping() {
        for block_type in [BlockType::Stored, BlockType::Fixed, BlockType::Dynamic] {
            assert_eq!(BlockType::from_btype(block_type.btype()), Some(block_type));
            assert_eq!(block_type.name().parse::<BlockType>(), Ok(block_type));
        }
        assert_eq!(BlockType::from_btype(3), None);
        assert!("huffman".parse::<BlockType>().is_err());
    }
}
