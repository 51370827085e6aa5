//! History window for resolving LZ77 back-references during decompression.
//!
//! The window keeps the most recent `capacity` decoded bytes in a circular
//! buffer. Its fill level grows with the output until it reaches the
//! capacity, after which every new byte evicts the oldest one. A
//! back-reference may only reach as far back as the current fill level.

use crate::error::{FlatGzError, Result};

/// Window size for DEFLATE (32 KB), also the largest legal distance.
pub const DEFLATE_WINDOW_SIZE: usize = 32768;

/// A bounded history of decoded bytes.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    /// The underlying buffer.
    buffer: Vec<u8>,
    /// Current write position (next byte will be written here).
    position: usize,
    /// Number of valid bytes (up to capacity).
    size: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl HistoryWindow {
    /// Create a new window with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of 2 or is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of 2, got {}",
            capacity
        );

        Self {
            buffer: vec![0; capacity],
            position: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    /// Create a window sized for DEFLATE (32 KB).
    pub fn deflate() -> Self {
        Self::new(DEFLATE_WINDOW_SIZE)
    }

    /// Maximum number of bytes the window retains.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes currently available for back-references.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.position = 0;
        self.size = 0;
    }

    /// Append a byte, evicting the oldest one when full.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
        if self.size < self.buffer.len() {
            self.size += 1;
        }
    }

    /// Append a run of bytes.
    pub fn push_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Byte `distance` positions back (1 = most recent).
    pub fn byte_at_distance(&self, distance: usize) -> Result<u8> {
        if distance == 0 || distance > self.size {
            return Err(FlatGzError::invalid_back_reference(distance, self.size));
        }

        Ok(self.buffer[self.position.wrapping_sub(distance) & self.mask])
    }

    /// Resolve a back-reference: copy `length` bytes starting `distance`
    /// bytes back, one at a time, appending each to the history and to
    /// `output`. Overlapping copies (`distance < length`) repeat the pattern.
    pub fn copy_match(&mut self, distance: usize, length: usize, output: &mut Vec<u8>) -> Result<()> {
        if distance == 0 || distance > self.size {
            return Err(FlatGzError::invalid_back_reference(distance, self.size));
        }

        output.reserve(length);
        let mut src = self.position.wrapping_sub(distance) & self.mask;
        for _ in 0..length {
            let byte = self.buffer[src];
            self.push(byte);
            output.push(byte);
            src = (src + 1) & self.mask;
        }

        Ok(())
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::deflate()
    }
}
