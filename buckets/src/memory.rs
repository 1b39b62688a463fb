//! In-memory bucket.

use bytes::Bytes;
use sluice_bucket::{Bucket, BucketType, Eol, EolSet, Result, Scratch, Span, scan};

use crate::check_requested;

/// A bucket over bytes held in memory.
///
/// The whole remainder is always visible, so peek reports EOF and line reads
/// never need to look ahead. Duplicates share the bytes and keep their own
/// offset.
#[derive(Debug, Clone)]
pub struct MemoryBucket {
    data: Bytes,
    offset: usize,
}

impl MemoryBucket {
    /// Type tag of [`MemoryBucket`].
    pub const TYPE: BucketType = BucketType::new("memory");

    /// Creates a bucket over `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        MemoryBucket {
            data: data.into(),
            offset: 0,
        }
    }

    /// Creates a bucket over static bytes without copying.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }

    /// Creates a bucket holding a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn remaining(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    fn consume(&mut self, n: usize) -> Span<'_> {
        if n == 0 {
            return Span::EOF;
        }
        let start = self.offset;
        self.offset += n;
        Span::new(&self.data[start..self.offset])
    }
}

impl Bucket for MemoryBucket {
    fn read(&mut self, requested: usize, _scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        let n = requested.min(self.remaining().len());
        Ok(self.consume(n))
    }

    fn read_until_newline(
        &mut self,
        acceptable: EolSet,
        requested: usize,
        _scratch: &Scratch,
    ) -> Result<(Span<'_>, Eol)> {
        check_requested(requested)?;
        let rest = self.remaining();
        let window = &rest[..requested.min(rest.len())];
        let s = scan(acceptable, window, window.len() == rest.len());
        Ok((self.consume(s.len), s.found))
    }

    fn peek(&mut self, _no_poll: bool, _scratch: &Scratch) -> Result<Span<'_>> {
        Ok(Span::last(self.remaining()))
    }

    fn read_skip(&mut self, requested: usize, _scratch: &Scratch) -> Result<usize> {
        check_requested(requested)?;
        let n = requested.min(self.remaining().len());
        self.offset += n;
        Ok(n)
    }

    fn read_remaining_bytes(&mut self, _scratch: &Scratch) -> Result<u64> {
        Ok(self.remaining().len() as u64)
    }

    fn reset(&mut self, _scratch: &Scratch) -> Result<()> {
        self.offset = 0;
        Ok(())
    }

    fn can_reset(&self) -> bool {
        true
    }

    fn duplicate(&self, _scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        Ok(Box::new(self.clone()))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&Self::TYPE)
    }

    fn position(&self) -> Option<u64> {
        Some(self.offset as u64)
    }
}

impl From<Bytes> for MemoryBucket {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for MemoryBucket {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static str> for MemoryBucket {
    fn from(data: &'static str) -> Self {
        Self::from_static(data.as_bytes())
    }
}
