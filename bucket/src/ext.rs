//! Convenience operations built on the [`Bucket`] contract.
//!
//! These loop over the primitive operations, so they propagate
//! `WouldBlock` like any other error. After a `WouldBlock` part of the data
//! may already be consumed; use them on producers that never block, or be
//! ready to restart.

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::bucket::{Bucket, READ_ALL};
use crate::eol::{Eol, EolSet};
use crate::error::{BucketError, Result};
use crate::scratch::Scratch;

/// Carries a byte consumed past a lone `\r` into the next [`BucketExt::read_line`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EolState {
    kept: Option<u8>,
    cut: bool,
}

impl EolState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no byte is carried over.
    pub fn is_empty(&self) -> bool {
        self.kept.is_none()
    }

    /// Returns true if the last line read was cut at the maximum length.
    pub fn was_cut(&self) -> bool {
        self.cut
    }
}

/// Helpers available on every bucket.
pub trait BucketExt: Bucket {
    /// Reads a single byte, `None` at end of stream.
    fn read_byte(&mut self, scratch: &Scratch) -> Result<Option<u8>> {
        let span = self.read(1, scratch)?;
        Ok(span.first().copied())
    }

    /// Fills `buf` completely.
    ///
    /// Fails with [`BucketError::UnexpectedEof`] if the stream ends first.
    fn read_exact(&mut self, buf: &mut [u8], scratch: &Scratch) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let span = self.read(buf.len() - filled, scratch)?;
            if span.is_empty() {
                return Err(BucketError::UnexpectedEof { bucket: self.name() });
            }
            buf[filled..filled + span.len()].copy_from_slice(&span);
            filled += span.len();
        }
        Ok(())
    }

    /// Reads everything up to end of stream.
    fn read_to_vec(&mut self, scratch: &Scratch) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let span = self.read(READ_ALL, scratch)?;
            out.extend_from_slice(&span);
            if span.is_eof() {
                return Ok(out);
            }
        }
    }

    /// Skips to end of stream, returning the number of bytes skipped.
    fn drain(&mut self, scratch: &Scratch) -> Result<u64> {
        let mut total = 0u64;
        loop {
            let n = self.read_skip(READ_ALL, scratch)?;
            if n == 0 {
                return Ok(total);
            }
            total += n as u64;
        }
    }

    /// Reads one complete line of at most `max` bytes.
    ///
    /// Unlike [`Bucket::read_until_newline`] this keeps reading until a
    /// terminator, end of stream, or `max`, and resolves
    /// [`Eol::CrLfSplit`] by looking at the following byte. When that byte
    /// turns out not to be `\n` and a lone `\r` is acceptable, it is kept in
    /// `state` and starts the next line.
    ///
    /// A line cut at `max` is returned with [`Eol::None`] and
    /// [`EolState::was_cut`] set. A `\r` that could start `\r\n` is never
    /// left at the end of a cut line; it moves to the next one.
    ///
    /// Returns an empty line with [`Eol::None`] at end of stream.
    fn read_line(
        &mut self,
        acceptable: EolSet,
        state: &mut EolState,
        max: usize,
        scratch: &Scratch,
    ) -> Result<(Bytes, Eol)> {
        if max == 0 {
            return Err(BucketError::invalid_argument("max must be > 0"));
        }
        state.cut = false;
        let mut line = scratch.buffer(128.min(max));
        let lone_cr = if acceptable.contains(EolSet::CR) {
            Eol::Cr
        } else {
            Eol::None
        };

        // The line ends in a \r that may be the first half of \r\n.
        let mut split = false;
        if let Some(kept) = state.kept.take() {
            line.extend_from_slice(&[kept]);
            match kept {
                b'\n' if acceptable.contains(EolSet::LF) => {
                    return Ok((line.freeze(), Eol::Lf));
                }
                b'\r' if acceptable.contains(EolSet::CRLF) => split = true,
                b'\r' if acceptable.contains(EolSet::CR) => {
                    return Ok((line.freeze(), Eol::Cr));
                }
                _ => {}
            }
        }

        loop {
            if split {
                split = false;
                if line.len() >= max {
                    return Ok(cut_line(line, acceptable, state));
                }
                let next = {
                    let span = self.read(1, scratch)?;
                    span.first().copied()
                };
                match next {
                    Some(b'\n') => {
                        line.extend_from_slice(b"\n");
                        return Ok((line.freeze(), Eol::CrLf));
                    }
                    Some(b) if lone_cr == Eol::Cr => {
                        state.kept = Some(b);
                        return Ok((line.freeze(), Eol::Cr));
                    }
                    None => return Ok((line.freeze(), lone_cr)),
                    Some(b) => {
                        // A lone \r is data here.
                        line.extend_from_slice(&[b]);
                        split = b == b'\r';
                        continue;
                    }
                }
            }

            let left = max - line.len();
            if left == 0 {
                trace!(bucket = self.name(), max, "line reached max length");
                return Ok(cut_line(line, acceptable, state));
            }
            let (span, eol) = self.read_until_newline(acceptable, left, scratch)?;
            let at_eof = span.is_eof();
            line.extend_from_slice(&span);
            match eol {
                Eol::CrLfSplit => split = true,
                found if found.is_found() => return Ok((line.freeze(), found)),
                _ if at_eof => return Ok((line.freeze(), Eol::None)),
                _ => {}
            }
        }
    }
}

impl<B: Bucket + ?Sized> BucketExt for B {}

/// Returns `line` as cut at the maximum length.
fn cut_line(mut line: BytesMut, acceptable: EolSet, state: &mut EolState) -> (Bytes, Eol) {
    state.cut = true;
    if line.len() > 1 && acceptable.contains(EolSet::CRLF) && line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
        state.kept = Some(b'\r');
    }
    (line.freeze(), Eol::None)
}
