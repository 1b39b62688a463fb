//! `std::io::Read` adapter over a bucket.

use std::io::{self, Read};

use crate::bucket::Bucket;
use crate::config::BucketConfig;
use crate::scratch::Scratch;

/// Reads a bucket through [`std::io::Read`].
///
/// `WouldBlock` surfaces as [`io::ErrorKind::WouldBlock`]; end of stream as
/// `Ok(0)`.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use sluice_bucket::{BucketReader, Empty};
///
/// let mut reader = BucketReader::new(Empty);
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).unwrap();
/// assert!(out.is_empty());
/// ```
pub struct BucketReader<B> {
    bucket: B,
    scratch: Scratch,
    read_size: usize,
}

impl<B: Bucket> BucketReader<B> {
    /// Wraps `bucket` with default settings.
    pub fn new(bucket: B) -> Self {
        Self::with_config(bucket, &BucketConfig::default())
    }

    /// Wraps `bucket`, taking chunk and scratch sizes from `config`.
    pub fn with_config(bucket: B, config: &BucketConfig) -> Self {
        BucketReader {
            bucket,
            scratch: Scratch::with_config(config),
            read_size: config.read_size.max(1),
        }
    }

    /// Returns a reference to the wrapped bucket.
    pub fn get_ref(&self) -> &B {
        &self.bucket
    }

    /// Returns the wrapped bucket.
    pub fn into_inner(self) -> B {
        self.bucket
    }
}

impl<B: Bucket> Read for BucketReader<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let requested = buf.len().min(self.read_size);
        let span = self.bucket.read(requested, &self.scratch)?;
        buf[..span.len()].copy_from_slice(&span);
        Ok(span.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BucketError, Result};
    use crate::span::Span;

    /// Blocks once, then serves `data` in reads of at most three bytes.
    struct Flaky {
        data: Vec<u8>,
        pos: usize,
        blocked: bool,
    }

    impl Flaky {
        fn new(data: &[u8]) -> Self {
            Flaky {
                data: data.to_vec(),
                pos: 0,
                blocked: false,
            }
        }
    }

    impl Bucket for Flaky {
        fn read(&mut self, requested: usize, _scratch: &Scratch) -> Result<Span<'_>> {
            if !self.blocked {
                self.blocked = true;
                return Err(BucketError::WouldBlock);
            }
            let n = requested.min(3).min(self.data.len() - self.pos);
            let start = self.pos;
            self.pos += n;
            if n == 0 {
                return Ok(Span::EOF);
            }
            Ok(Span::new(&self.data[start..start + n]))
        }
    }

    #[test]
    fn test_would_block_maps_to_io() {
        let mut reader = BucketReader::new(Flaky::new(b"abcdefg"));
        let mut buf = [0u8; 8];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abcdefg");
    }

    #[test]
    fn test_read_size_caps_chunks() {
        let config = BucketConfig::new().with_read_size(2);
        let mut reader = BucketReader::with_config(Flaky::new(b"abcdef"), &config);
        let mut buf = [0u8; 8];
        assert!(reader.read(&mut buf).is_err());
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(reader.get_ref().pos, 2);
    }

    #[test]
    fn test_read_to_end_on_empty() {
        let mut reader = BucketReader::new(crate::bucket::Empty);
        let mut out = Vec::new();
        assert_eq!(reader.read_to_end(&mut out).unwrap(), 0);
    }
}
