//! Base64 decoding wrapper.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sluice_bucket::{Bucket, BucketError, BucketType, Result, Scratch, Span};
use tracing::warn;

use crate::check_requested;

const BASE64: BucketType = BucketType::new("base64");

/// Most decoded bytes produced per refill.
const CHUNK: usize = 6 * 1024;

/// Decodes standard base64 read from the inner bucket.
///
/// ASCII whitespace in the input is ignored, so line-wrapped input decodes.
/// The encoded input is staged in the caller's scratch scope; only decoded
/// bytes and at most three leftover input bytes live in the bucket.
#[derive(Debug)]
pub struct Base64DecodeBucket<B> {
    inner: B,
    /// Encoded bytes that did not fill a quantum yet.
    pending: Vec<u8>,
    decoded: Vec<u8>,
    offset: usize,
    /// The inner bucket reported EOF.
    done: bool,
    failed: bool,
    position: u64,
}

impl<B: Bucket> Base64DecodeBucket<B> {
    /// Type tag of [`Base64DecodeBucket`].
    pub const TYPE: BucketType = BASE64;

    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Base64DecodeBucket {
            inner,
            pending: Vec::new(),
            decoded: Vec::new(),
            offset: 0,
            done: false,
            failed: false,
            position: 0,
        }
    }

    /// Returns the inner bucket.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn available(&self) -> usize {
        self.decoded.len() - self.offset
    }

    /// Decodes the next run of input. Leaves `decoded` empty only at end of
    /// stream.
    fn refill(&mut self, requested: usize, scratch: &Scratch) -> Result<()> {
        if self.failed {
            return Err(BucketError::failed("base64 stream already failed"));
        }
        let want = requested.min(CHUNK).div_ceil(3) * 4;
        while !self.done {
            let mut staged = scratch.buffer(self.pending.len() + want);
            staged.extend_from_slice(&self.pending);
            {
                let span = self.inner.read(want, scratch)?;
                staged.extend(span.iter().copied().filter(|b| !b.is_ascii_whitespace()));
                self.done = span.is_eof();
            }

            let whole = if self.done {
                staged.len()
            } else {
                staged.len() / 4 * 4
            };
            self.pending.clear();
            self.pending.extend_from_slice(&staged[whole..]);

            self.decoded.clear();
            self.offset = 0;
            if let Err(e) = STANDARD.decode_vec(&staged[..whole], &mut self.decoded) {
                warn!(error = %e, position = self.position, "invalid base64 input");
                self.failed = true;
                self.decoded.clear();
                return Err(BucketError::decode("base64", "invalid base64 input", e));
            }
            if !self.decoded.is_empty() {
                break;
            }
        }
        Ok(())
    }
}

impl<B: Bucket> Bucket for Base64DecodeBucket<B> {
    fn read(&mut self, requested: usize, scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        if self.available() == 0 {
            if self.done && !self.failed {
                return Ok(Span::EOF);
            }
            self.refill(requested, scratch)?;
            if self.available() == 0 {
                return Ok(Span::EOF);
            }
        }
        let n = requested.min(self.available());
        let start = self.offset;
        self.offset += n;
        self.position += n as u64;
        Ok(Span::new(&self.decoded[start..start + n]))
    }

    fn peek(&mut self, no_poll: bool, scratch: &Scratch) -> Result<Span<'_>> {
        if self.available() == 0 && (!self.done || self.failed) && !no_poll {
            match self.refill(CHUNK, scratch) {
                Err(e) if e.is_would_block() => return Ok(Span::EMPTY),
                r => r?,
            }
        }
        if self.available() == 0 && self.done {
            return Ok(Span::EOF);
        }
        Ok(Span::with_eof(&self.decoded[self.offset..], self.done))
    }

    fn reset(&mut self, scratch: &Scratch) -> Result<()> {
        self.inner.reset(scratch)?;
        self.pending.clear();
        self.decoded.clear();
        self.offset = 0;
        self.done = false;
        self.failed = false;
        self.position = 0;
        Ok(())
    }

    fn can_reset(&self) -> bool {
        self.inner.can_reset()
    }

    fn duplicate(&self, scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        let inner = self.inner.duplicate(scratch)?;
        Ok(Box::new(Base64DecodeBucket {
            inner,
            pending: self.pending.clone(),
            decoded: self.decoded[self.offset..].to_vec(),
            offset: 0,
            done: self.done,
            failed: self.failed,
            position: self.position,
        }))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&BASE64)
    }

    fn position(&self) -> Option<u64> {
        Some(self.position)
    }
}
