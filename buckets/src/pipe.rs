//! Non-blocking bucket fed by a writer handle.
//!
//! [`pipe`] returns a connected [`PipeWriter`] and [`PipeBucket`]. The writer
//! may live on another thread. The bucket never waits: with nothing buffered
//! and the writer still open, reads report `WouldBlock`.

use std::error::Error as StdError;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use sluice_bucket::{Bucket, BucketError, BucketType, Result, Scratch, Span};
use tracing::debug;

use crate::check_requested;

type CloseError = Arc<dyn StdError + Send + Sync>;

struct PipeState {
    buf: BytesMut,
    closed: bool,
    error: Option<CloseError>,
}

/// Creates a connected writer and bucket.
pub fn pipe() -> (PipeWriter, PipeBucket) {
    let shared = Arc::new(Mutex::new(PipeState {
        buf: BytesMut::new(),
        closed: false,
        error: None,
    }));
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeBucket {
            shared,
            current: Bytes::new(),
            offset: 0,
            closed: false,
        },
    )
}

/// Producer side of a pipe.
///
/// Dropping the writer closes the pipe.
pub struct PipeWriter {
    shared: Arc<Mutex<PipeState>>,
}

impl PipeWriter {
    /// Appends `data` for the bucket to read.
    ///
    /// Fails once the pipe is closed.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let mut state = self.shared.lock();
        if let Some(err) = &state.error {
            return Err(closed_with(err));
        }
        if state.closed {
            return Err(BucketError::failed("write on closed pipe"));
        }
        state.buf.extend_from_slice(data);
        Ok(())
    }

    /// Closes the pipe. Buffered data stays readable, then the bucket reports
    /// EOF. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if !state.closed {
            debug!(buffered = state.buf.len(), "pipe closed");
            state.closed = true;
        }
    }

    /// Closes the pipe with `err`. Buffered data is dropped and the bucket
    /// fails with `err` as the cause.
    pub fn close_with_error<E>(&self, err: E)
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut state = self.shared.lock();
        if state.error.is_some() {
            return;
        }
        debug!(error = %err, "pipe closed with error");
        state.error = Some(Arc::new(err));
        state.closed = true;
        state.buf.clear();
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeWriter").finish_non_exhaustive()
    }
}

fn closed_with(err: &CloseError) -> BucketError {
    BucketError::Failed {
        message: "pipe closed with error".to_string(),
        source: Some(Box::new(Arc::clone(err))),
    }
}

/// Consumer side of a pipe.
pub struct PipeBucket {
    shared: Arc<Mutex<PipeState>>,
    current: Bytes,
    offset: usize,
    /// The writer closed and `current` holds the last data.
    closed: bool,
}

impl PipeBucket {
    /// Type tag of [`PipeBucket`].
    pub const TYPE: BucketType = BucketType::new("pipe");

    fn available(&self) -> usize {
        self.current.len() - self.offset
    }

    /// Moves everything the writer buffered into `current`.
    fn refill(&mut self) -> Result<()> {
        let mut state = self.shared.lock();
        if let Some(err) = &state.error {
            return Err(closed_with(err));
        }
        if !state.buf.is_empty() {
            self.current = state.buf.split().freeze();
            self.offset = 0;
        }
        self.closed = state.closed;
        Ok(())
    }

    fn at_end(&self) -> bool {
        self.closed && self.available() == 0
    }
}

impl Bucket for PipeBucket {
    fn read(&mut self, requested: usize, _scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        if self.available() == 0 {
            if self.closed {
                return Ok(Span::EOF);
            }
            self.refill()?;
            if self.available() == 0 {
                return if self.closed {
                    Ok(Span::EOF)
                } else {
                    Err(BucketError::WouldBlock)
                };
            }
        }
        let n = requested.min(self.available());
        let start = self.offset;
        self.offset += n;
        Ok(Span::new(&self.current[start..start + n]))
    }

    fn peek(&mut self, no_poll: bool, _scratch: &Scratch) -> Result<Span<'_>> {
        if self.available() == 0 && !self.closed && !no_poll {
            self.refill()?;
        }
        if self.at_end() {
            return Ok(Span::EOF);
        }
        Ok(Span::with_eof(&self.current[self.offset..], self.closed))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&Self::TYPE)
    }
}

impl std::fmt::Debug for PipeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeBucket")
            .field("available", &self.available())
            .field("closed", &self.closed)
            .finish()
    }
}
