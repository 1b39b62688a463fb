//! Pull-based, composable byte streams.
//!
//! A [`Bucket`] is a single-pass byte stream that a consumer drains by
//! pulling: read, peek, skip, line reads and vectorized reads. Buckets wrap
//! buckets, so a pipeline is a tree of owned buckets pulled from its root.
//!
//! Every operation receives a [`Scratch`] scope for transient allocations and
//! returns a [`Result`]. Data comes back as a [`Span`] borrowed from the
//! bucket, valid until the next call on it.
//!
//! # Example
//!
//! ```
//! use sluice_bucket::{Bucket, BucketExt, Empty, Scratch, READ_ALL};
//!
//! let scratch = Scratch::new();
//! let mut bucket = Empty;
//!
//! let span = bucket.read(READ_ALL, &scratch).unwrap();
//! assert!(span.is_eof());
//! assert!(bucket.read_to_vec(&scratch).unwrap().is_empty());
//! ```
//!
//! # Outcomes
//!
//! - Data: a non-empty [`Span`].
//! - End of stream: an empty span with the EOF flag, repeated on every later
//!   read.
//! - [`BucketError::WouldBlock`]: nothing ready yet, nothing changed.
//! - [`BucketError::NotImplemented`]: capability absent, nothing changed.
//! - Any other error is a failure.
//!
//! Concrete kinds live in the `sluice-buckets` crate.

mod bucket;
mod config;
mod eol;
mod error;
mod ext;
mod reader;
mod scratch;
mod span;

pub use bucket::{
    Bucket, BucketType, Empty, IovecRead, READ_ALL, default_read_iovec, default_read_skip,
    default_read_until_newline,
};
pub use config::{
    BucketConfig, DEFAULT_FILE_BUFFER_SIZE, DEFAULT_MAX_LINE_LENGTH, DEFAULT_READ_SIZE,
};
pub use eol::{Eol, EolSet, LineScan, scan};
pub use error::{BoxError, BucketError, ErrorKind, Result};
pub use ext::{BucketExt, EolState};
pub use reader::BucketReader;
pub use scratch::{DEFAULT_BLOCK_SIZE, Scratch};
pub use span::Span;
