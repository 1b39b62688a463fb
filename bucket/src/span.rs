//! Borrowed views returned by read-like bucket operations.

use std::fmt;
use std::ops::Deref;

/// A non-owning view over bytes produced by a bucket.
///
/// A `Span` borrows from the bucket that returned it, so the borrow checker
/// ends it at the next mutating call on that bucket. Copy the bytes out
/// (`to_vec`, `Bytes::copy_from_slice`) to keep them longer.
///
/// Consuming reads report end of stream only as a zero-length span with the
/// `eof` flag set. On a peek the flag may accompany data, meaning the span
/// holds everything that is left.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span<'a> {
    data: &'a [u8],
    eof: bool,
}

impl Span<'static> {
    /// Zero-length span signalling end of stream.
    pub const EOF: Span<'static> = Span {
        data: &[],
        eof: true,
    };

    /// Zero-length span without end of stream, as returned by a peek with
    /// nothing buffered.
    pub const EMPTY: Span<'static> = Span {
        data: &[],
        eof: false,
    };
}

impl<'a> Span<'a> {
    /// Creates a span over `data` with more data possibly following.
    pub const fn new(data: &'a [u8]) -> Self {
        Span { data, eof: false }
    }

    /// Creates a span over all remaining bytes, as returned by a peek.
    pub const fn last(data: &'a [u8]) -> Self {
        Span { data, eof: true }
    }

    /// Creates a span with an explicit end-of-stream flag.
    pub const fn with_eof(data: &'a [u8], eof: bool) -> Self {
        Span { data, eof }
    }

    /// Returns the viewed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    /// Consumes the span, returning the bytes with the span's full lifetime.
    pub fn into_bytes(self) -> &'a [u8] {
        self.data
    }

    /// Returns true if no more data follows this span.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Returns the number of bytes in the span.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the span holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a span over the first `len` bytes.
    ///
    /// The EOF flag survives only when nothing is cut off.
    pub fn truncate(self, len: usize) -> Self {
        if len >= self.data.len() {
            return self;
        }
        Span {
            data: &self.data[..len],
            eof: false,
        }
    }
}

impl Deref for Span<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl AsRef<[u8]> for Span<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span(\"{}\"", self.data.escape_ascii())?;
        if self.eof {
            write!(f, ", eof")?;
        }
        write!(f, ")")
    }
}
