//! Tunables shared by buckets and their adapters.

use serde::{Deserialize, Serialize};

use crate::error::{BucketError, Result};

/// Default chunk size for adapters that read on behalf of a caller.
pub const DEFAULT_READ_SIZE: usize = 8 * 1024;
/// Default buffer size of file-backed buckets.
pub const DEFAULT_FILE_BUFFER_SIZE: usize = 16 * 1024;
/// Default cap on a single line assembled by `read_line`.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Bucket configuration.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Bytes requested per read by adapters such as `BucketReader`.
    pub read_size: usize,
    /// Private buffer size of file-backed buckets.
    pub file_buffer_size: usize,
    /// Longest line `read_line` assembles before returning it unterminated.
    pub max_line_length: usize,
    /// Block size of scratch scopes.
    pub scratch_block_size: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            scratch_block_size: crate::scratch::DEFAULT_BLOCK_SIZE,
        }
    }
}

impl BucketConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the adapter read size.
    pub fn with_read_size(mut self, bytes: usize) -> Self {
        self.read_size = bytes;
        self
    }

    /// Set the file buffer size.
    pub fn with_file_buffer_size(mut self, bytes: usize) -> Self {
        self.file_buffer_size = bytes;
        self
    }

    /// Set the maximum line length.
    pub fn with_max_line_length(mut self, bytes: usize) -> Self {
        self.max_line_length = bytes;
        self
    }

    /// Set the scratch block size.
    pub fn with_scratch_block_size(mut self, bytes: usize) -> Self {
        self.scratch_block_size = bytes;
        self
    }

    /// Checks that every size is usable.
    pub fn validate(&self) -> Result<()> {
        if self.read_size == 0 {
            return Err(BucketError::invalid_argument("read_size must be > 0"));
        }
        if self.file_buffer_size == 0 {
            return Err(BucketError::invalid_argument(
                "file_buffer_size must be > 0",
            ));
        }
        if self.max_line_length == 0 {
            return Err(BucketError::invalid_argument(
                "max_line_length must be > 0",
            ));
        }
        if self.scratch_block_size == 0 {
            return Err(BucketError::invalid_argument(
                "scratch_block_size must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BucketConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.read_size, DEFAULT_READ_SIZE);
    }

    #[test]
    fn test_builders() {
        let config = BucketConfig::new()
            .with_read_size(512)
            .with_file_buffer_size(1024)
            .with_max_line_length(80)
            .with_scratch_block_size(256);
        assert_eq!(config.read_size, 512);
        assert_eq!(config.file_buffer_size, 1024);
        assert_eq!(config.max_line_length, 80);
        assert_eq!(config.scratch_block_size, 256);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = BucketConfig::new().with_read_size(0).validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: BucketConfig = serde_yaml::from_str("max_line_length: 4096\n").unwrap();
        assert_eq!(config.max_line_length, 4096);
        assert_eq!(config.file_buffer_size, DEFAULT_FILE_BUFFER_SIZE);
    }
}
