//! Length-limiting wrapper.

use std::io::IoSlice;

use sluice_bucket::{
    Bucket, BucketError, BucketType, Eol, EolSet, IovecRead, Result, Scratch, Span,
};

use crate::check_requested;

const TAKE: BucketType = BucketType::new("take");

/// Yields at most `limit` bytes of the inner bucket.
///
/// An exact take (see [`TakeBucket::exact`]) additionally requires the inner
/// bucket to hold `limit` bytes and fails with `UnexpectedEof` when it ends
/// early. Reset rewinds the inner bucket, so it assumes the take started at
/// the inner bucket's beginning.
#[derive(Debug)]
pub struct TakeBucket<B> {
    inner: B,
    limit: u64,
    taken: u64,
    exact: bool,
}

impl<B: Bucket> TakeBucket<B> {
    /// Type tag of [`TakeBucket`].
    pub const TYPE: BucketType = TAKE;

    /// Limits `inner` to `limit` bytes.
    pub fn new(inner: B, limit: u64) -> Self {
        TakeBucket {
            inner,
            limit,
            taken: 0,
            exact: false,
        }
    }

    /// Limits `inner` to exactly `limit` bytes.
    pub fn exact(inner: B, limit: u64) -> Self {
        TakeBucket {
            exact: true,
            ..Self::new(inner, limit)
        }
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the inner bucket, leaving untaken data in it.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn left(&self) -> u64 {
        self.limit - self.taken
    }

    fn cap(&self, requested: usize) -> usize {
        (requested as u64).min(self.left()) as usize
    }

    fn premature_eof(&self) -> BucketError {
        BucketError::UnexpectedEof { bucket: TAKE.name }
    }
}

impl<B: Bucket> Bucket for TakeBucket<B> {
    fn read(&mut self, requested: usize, scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        if self.left() == 0 {
            return Ok(Span::EOF);
        }
        let want = self.cap(requested);
        let exact = self.exact;
        let premature = self.premature_eof();
        let span = self.inner.read(want, scratch)?;
        if span.is_empty() && span.is_eof() {
            return if exact { Err(premature) } else { Ok(Span::EOF) };
        }
        self.taken += span.len() as u64;
        Ok(span)
    }

    fn read_until_newline(
        &mut self,
        acceptable: EolSet,
        requested: usize,
        scratch: &Scratch,
    ) -> Result<(Span<'_>, Eol)> {
        check_requested(requested)?;
        if self.left() == 0 {
            return Ok((Span::EOF, Eol::None));
        }
        let want = self.cap(requested);
        let exact = self.exact;
        let premature = self.premature_eof();
        let (span, mut eol) = self.inner.read_until_newline(acceptable, want, scratch)?;
        if span.is_empty() && span.is_eof() {
            return if exact {
                Err(premature)
            } else {
                Ok((Span::EOF, Eol::None))
            };
        }
        self.taken += span.len() as u64;
        if eol == Eol::CrLfSplit && self.taken == self.limit {
            // Nothing follows the limit, so the trailing \r stands alone.
            eol = if acceptable.contains(EolSet::CR) {
                Eol::Cr
            } else {
                Eol::None
            };
        }
        Ok((span, eol))
    }

    fn read_iovec<'a>(
        &'a mut self,
        requested: usize,
        vecs: &mut [IoSlice<'a>],
        scratch: &Scratch,
    ) -> Result<IovecRead> {
        check_requested(requested)?;
        if vecs.is_empty() {
            return Err(BucketError::invalid_argument(
                "read_iovec needs at least one slot",
            ));
        }
        if self.left() == 0 {
            return Ok(IovecRead {
                eof: true,
                ..IovecRead::default()
            });
        }
        let want = self.cap(requested);
        let premature = self.premature_eof();
        let TakeBucket {
            inner,
            taken,
            exact,
            ..
        } = self;
        let got = inner.read_iovec(want, vecs, scratch)?;
        if got.len == 0 && got.eof && *exact {
            return Err(premature);
        }
        *taken += got.len as u64;
        Ok(got)
    }

    fn peek(&mut self, no_poll: bool, scratch: &Scratch) -> Result<Span<'_>> {
        let left = self.left();
        if left == 0 {
            return Ok(Span::EOF);
        }
        let span = self.inner.peek(no_poll, scratch)?;
        let eof = span.is_eof();
        let data = span.into_bytes();
        let n = (data.len() as u64).min(left) as usize;
        Ok(Span::with_eof(&data[..n], n as u64 == left || eof))
    }

    fn read_skip(&mut self, requested: usize, scratch: &Scratch) -> Result<usize> {
        check_requested(requested)?;
        if self.left() == 0 {
            return Ok(0);
        }
        let want = self.cap(requested);
        let n = self.inner.read_skip(want, scratch)?;
        if n == 0 && self.exact {
            return Err(self.premature_eof());
        }
        self.taken += n as u64;
        Ok(n)
    }

    fn read_remaining_bytes(&mut self, scratch: &Scratch) -> Result<u64> {
        let left = self.left();
        if self.exact || left == 0 {
            return Ok(left);
        }
        Ok(self.inner.read_remaining_bytes(scratch)?.min(left))
    }

    fn reset(&mut self, scratch: &Scratch) -> Result<()> {
        self.inner.reset(scratch)?;
        self.taken = 0;
        Ok(())
    }

    fn can_reset(&self) -> bool {
        self.inner.can_reset()
    }

    fn duplicate(&self, scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        let inner = self.inner.duplicate(scratch)?;
        Ok(Box::new(TakeBucket {
            inner,
            limit: self.limit,
            taken: self.taken,
            exact: self.exact,
        }))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&TAKE)
    }

    fn position(&self) -> Option<u64> {
        Some(self.taken)
    }
}
