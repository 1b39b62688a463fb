//! The bucket contract.
//!
//! A [`Bucket`] is a single-pass, pull-based byte stream. Concrete kinds
//! implement [`Bucket::read`] and override whichever other operations they can
//! do better than the defaults provided here.

use std::fmt;
use std::io::IoSlice;

use crate::eol::{self, Eol, EolSet};
use crate::error::{BucketError, Result};
use crate::scratch::Scratch;
use crate::span::Span;

/// Pass as `requested` to accept as much data as is convenient.
pub const READ_ALL: usize = usize::MAX;

/// Stable identifier of a concrete bucket kind.
///
/// Used for type-directed extraction with [`Bucket::read_bucket`]. Two types
/// are equal when their names are.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketType {
    /// Kind name, e.g. `"memory"`.
    pub name: &'static str,
}

impl BucketType {
    /// Creates a type tag.
    pub const fn new(name: &'static str) -> Self {
        BucketType { name }
    }
}

impl fmt::Debug for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketType({})", self.name)
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Outcome of [`Bucket::read_iovec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IovecRead {
    /// Number of entries filled, from the front of the slice.
    pub used: usize,
    /// Total bytes across the filled entries.
    pub len: usize,
    /// True at end of stream; then no entries are filled.
    pub eof: bool,
}

/// A pull-based byte stream.
///
/// # Data lifetime
///
/// Spans and iovec entries borrow the bucket mutably, so they stay valid only
/// until the next call on the same bucket. The borrow checker enforces this.
///
/// # Outcomes
///
/// - Data: a non-empty [`Span`] without the EOF flag. A successful read
///   never returns zero bytes unless it reports EOF.
/// - End of stream: [`Span::EOF`], a zero-length span with the EOF flag.
///   Every later read returns it again. Only [`Bucket::peek`] sets the flag
///   on data.
/// - [`BucketError::WouldBlock`]: a non-blocking producer has nothing ready.
///   Nothing changed; retry later.
/// - [`BucketError::NotImplemented`]: the kind lacks the capability. Nothing
///   changed.
/// - Other errors are failures. Behavior of later calls is kind-specific.
///
/// # Requested sizes
///
/// `requested == 0` is a caller error reported as
/// [`BucketError::InvalidArgument`] without consuming data. Use [`READ_ALL`]
/// for "whatever is convenient".
///
/// Buckets are single-owner and not reentrant. Ownership transfers by move:
/// dropping a bucket releases everything it holds.
pub trait Bucket: Send {
    /// Consumes up to `requested` bytes.
    fn read(&mut self, requested: usize, scratch: &Scratch) -> Result<Span<'_>>;

    /// Consumes up to `requested` bytes, stopping after the first terminator
    /// in `acceptable`. The terminator is part of the returned span.
    ///
    /// When no terminator is found within `requested` bytes or the available
    /// data, the found kind is [`Eol::None`].
    fn read_until_newline(
        &mut self,
        acceptable: EolSet,
        requested: usize,
        scratch: &Scratch,
    ) -> Result<(Span<'_>, Eol)> {
        default_read_until_newline(self, acceptable, requested, scratch)
    }

    /// Fills entries of `vecs` with at most `requested` bytes in total.
    ///
    /// `vecs` must hold at least one slot. The default performs exactly one
    /// [`Bucket::read`] and fills one entry, so every bucket supports
    /// vectorized reads.
    fn read_iovec<'a>(
        &'a mut self,
        requested: usize,
        vecs: &mut [IoSlice<'a>],
        scratch: &Scratch,
    ) -> Result<IovecRead> {
        default_read_iovec(self, requested, vecs, scratch)
    }

    /// Returns the data currently available without consuming it.
    ///
    /// Repeated peeks without a consuming call in between return the same
    /// data. The EOF flag means the span holds all remaining data. Peek never
    /// reports `WouldBlock`: with nothing ready it returns an empty span.
    /// With `no_poll` set the bucket only reports what it already buffered.
    fn peek(&mut self, no_poll: bool, scratch: &Scratch) -> Result<Span<'_>> {
        let _ = (no_poll, scratch);
        Ok(Span::EMPTY)
    }

    /// Consumes up to `requested` bytes without handing them to the caller.
    ///
    /// Returns the number of bytes skipped; zero means end of stream.
    fn read_skip(&mut self, requested: usize, scratch: &Scratch) -> Result<usize> {
        default_read_skip(self, requested, scratch)
    }

    /// Returns the exact number of unread bytes.
    ///
    /// `NotImplemented` means "unknown", not a failure.
    fn read_remaining_bytes(&mut self, scratch: &Scratch) -> Result<u64> {
        let _ = scratch;
        Err(BucketError::not_implemented(self.name(), "read_remaining_bytes"))
    }

    /// Rewinds to the original starting position.
    ///
    /// On `NotImplemented` nothing was rewound.
    fn reset(&mut self, scratch: &Scratch) -> Result<()> {
        let _ = scratch;
        Err(BucketError::not_implemented(self.name(), "reset"))
    }

    /// Returns true if [`Bucket::reset`] would succeed.
    fn can_reset(&self) -> bool {
        false
    }

    /// Creates an independent bucket yielding the same remaining data.
    ///
    /// The original is not disturbed, whether or not this succeeds.
    fn duplicate(&self, scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        let _ = scratch;
        Err(BucketError::not_implemented(self.name(), "duplicate"))
    }

    /// Extracts an embedded bucket of `bucket_type` from the head of the
    /// remaining data.
    ///
    /// On a match the sub-bucket is consumed from `self` and moved to the
    /// caller. Otherwise `self` is left unconsumed and `None` is returned.
    fn read_bucket(
        &mut self,
        bucket_type: &BucketType,
        scratch: &Scratch,
    ) -> Result<Option<Box<dyn Bucket>>> {
        let _ = (bucket_type, scratch);
        Ok(None)
    }

    /// Returns the kind's type tag; `None` for untyped buckets.
    fn bucket_type(&self) -> Option<&'static BucketType> {
        None
    }

    /// Returns a name for diagnostics.
    fn name(&self) -> &'static str {
        self.bucket_type().map_or("untyped", |t| t.name)
    }

    /// Returns the number of bytes consumed so far, if tracked.
    fn position(&self) -> Option<u64> {
        None
    }
}

impl<B: Bucket + ?Sized> Bucket for Box<B> {
    fn read(&mut self, requested: usize, scratch: &Scratch) -> Result<Span<'_>> {
        (**self).read(requested, scratch)
    }

    fn read_until_newline(
        &mut self,
        acceptable: EolSet,
        requested: usize,
        scratch: &Scratch,
    ) -> Result<(Span<'_>, Eol)> {
        (**self).read_until_newline(acceptable, requested, scratch)
    }

    fn read_iovec<'a>(
        &'a mut self,
        requested: usize,
        vecs: &mut [IoSlice<'a>],
        scratch: &Scratch,
    ) -> Result<IovecRead> {
        (**self).read_iovec(requested, vecs, scratch)
    }

    fn peek(&mut self, no_poll: bool, scratch: &Scratch) -> Result<Span<'_>> {
        (**self).peek(no_poll, scratch)
    }

    fn read_skip(&mut self, requested: usize, scratch: &Scratch) -> Result<usize> {
        (**self).read_skip(requested, scratch)
    }

    fn read_remaining_bytes(&mut self, scratch: &Scratch) -> Result<u64> {
        (**self).read_remaining_bytes(scratch)
    }

    fn reset(&mut self, scratch: &Scratch) -> Result<()> {
        (**self).reset(scratch)
    }

    fn can_reset(&self) -> bool {
        (**self).can_reset()
    }

    fn duplicate(&self, scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        (**self).duplicate(scratch)
    }

    fn read_bucket(
        &mut self,
        bucket_type: &BucketType,
        scratch: &Scratch,
    ) -> Result<Option<Box<dyn Bucket>>> {
        (**self).read_bucket(bucket_type, scratch)
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        (**self).bucket_type()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn position(&self) -> Option<u64> {
        (**self).position()
    }
}

fn check_requested(requested: usize) -> Result<()> {
    if requested == 0 {
        return Err(BucketError::invalid_argument("requested must be > 0"));
    }
    Ok(())
}

/// Default line read: peek, scan the visible bytes, then read no further than
/// the first terminator.
///
/// When no terminator is visible, one byte past the visible data is requested
/// (two when only `\r\n` is acceptable) so a terminator arriving right after
/// the peeked data is still recognized.
pub fn default_read_until_newline<'b, B: Bucket + ?Sized>(
    bucket: &'b mut B,
    acceptable: EolSet,
    requested: usize,
    scratch: &Scratch,
) -> Result<(Span<'b>, Eol)> {
    check_requested(requested)?;
    if acceptable.is_empty() {
        let span = bucket.read(requested, scratch)?;
        return Ok((span, Eol::None));
    }

    // A peek flagged EOF holds everything left, so its end is the stream's.
    let (plan, whole) = {
        let peeked = bucket.peek(false, scratch)?;
        if peeked.is_eof() && peeked.is_empty() {
            return Ok((Span::EOF, Eol::None));
        }
        let whole = peeked.is_eof().then_some(peeked.len());
        let s = eol::scan(acceptable, &peeked, peeked.is_eof());
        if s.found.is_found() {
            (s, whole)
        } else {
            let len = s.len.saturating_add(eol::lookahead(acceptable));
            (eol::LineScan { len, found: Eol::None }, whole)
        }
    };

    let span = bucket.read(plan.len.min(requested), scratch)?;
    let found = if plan.found.is_found() && span.len() == plan.len {
        plan.found
    } else {
        let at_eof = span.is_eof() || whole == Some(span.len());
        let s = eol::scan(acceptable, &span, at_eof);
        if s.len == span.len() { s.found } else { Eol::None }
    };
    Ok((span, found))
}

/// Default vectorized read: one [`Bucket::read`], one entry.
pub fn default_read_iovec<'a, B: Bucket + ?Sized>(
    bucket: &'a mut B,
    requested: usize,
    vecs: &mut [IoSlice<'a>],
    scratch: &Scratch,
) -> Result<IovecRead> {
    if vecs.is_empty() {
        return Err(BucketError::invalid_argument(
            "read_iovec needs at least one slot",
        ));
    }
    let span = bucket.read(requested, scratch)?;
    let eof = span.is_eof();
    let data = span.into_bytes();
    if data.is_empty() {
        return Ok(IovecRead { used: 0, len: 0, eof });
    }
    vecs[0] = IoSlice::new(data);
    Ok(IovecRead {
        used: 1,
        len: data.len(),
        eof: false,
    })
}

/// Default skip: one [`Bucket::read`], reporting its length.
pub fn default_read_skip<B: Bucket + ?Sized>(
    bucket: &mut B,
    requested: usize,
    scratch: &Scratch,
) -> Result<usize> {
    let span = bucket.read(requested, scratch)?;
    Ok(span.len())
}

/// A bucket without data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl Empty {
    /// Type tag of [`Empty`].
    pub const TYPE: BucketType = BucketType::new("empty");
}

impl Bucket for Empty {
    fn read(&mut self, requested: usize, _scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        Ok(Span::EOF)
    }

    fn peek(&mut self, _no_poll: bool, _scratch: &Scratch) -> Result<Span<'_>> {
        Ok(Span::EOF)
    }

    fn read_remaining_bytes(&mut self, _scratch: &Scratch) -> Result<u64> {
        Ok(0)
    }

    fn reset(&mut self, _scratch: &Scratch) -> Result<()> {
        Ok(())
    }

    fn can_reset(&self) -> bool {
        true
    }

    fn duplicate(&self, _scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        Ok(Box::new(Empty))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&Self::TYPE)
    }

    fn position(&self) -> Option<u64> {
        Some(0)
    }
}
