//! Error types for bucket operations.
//!
//! Every bucket operation returns [`Result`]. Callers branch on
//! [`BucketError::kind`]: `WouldBlock` is retried later, `NotImplemented` is
//! treated as "capability absent", and only `Failed` is a real fault.

use std::error::Error as StdError;
use std::io;

/// Result type alias for bucket operations.
pub type Result<T> = std::result::Result<T, BucketError>;

/// Boxed error used as a failure cause.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Coarse classification of a [`BucketError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bucket kind does not support the operation. No state changed.
    NotImplemented,
    /// No data is available right now. No state changed; retry later.
    WouldBlock,
    /// The stream ended where more data was required.
    Eof,
    /// The caller broke the operation's contract. Nothing was consumed.
    InvalidArgument,
    /// A real fault: I/O, malformed data, allocation.
    Failed,
}

/// Bucket operation error.
#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    /// Operation not supported by this bucket kind.
    #[error("{op} not implemented on {bucket} bucket")]
    NotImplemented {
        bucket: &'static str,
        op: &'static str,
    },

    /// Non-blocking producer has no data ready.
    #[error("would block")]
    WouldBlock,

    /// The stream ended before the required amount of data was produced.
    #[error("unexpected eof in {bucket} bucket")]
    UnexpectedEof { bucket: &'static str },

    /// Caller contract violation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[source] io::Error),

    /// Malformed input detected by a transforming bucket.
    #[error("decode error in {bucket} bucket: {message}")]
    Decode {
        bucket: &'static str,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Generic failure with an optional cause chain.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl BucketError {
    /// Creates a `NotImplemented` error for `op` on `bucket`.
    pub fn not_implemented(bucket: &'static str, op: &'static str) -> Self {
        BucketError::NotImplemented { bucket, op }
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid_argument(what: &'static str) -> Self {
        BucketError::InvalidArgument(what)
    }

    /// Creates a generic failure without a cause.
    pub fn failed(message: impl Into<String>) -> Self {
        BucketError::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a decode failure, keeping `source` as the cause.
    pub fn decode<E>(bucket: &'static str, message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        BucketError::Decode {
            bucket,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BucketError::NotImplemented { .. } => ErrorKind::NotImplemented,
            BucketError::WouldBlock => ErrorKind::WouldBlock,
            BucketError::UnexpectedEof { .. } => ErrorKind::Eof,
            BucketError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BucketError::Io(_) | BucketError::Decode { .. } | BucketError::Failed { .. } => {
                ErrorKind::Failed
            }
        }
    }

    /// Returns true for [`ErrorKind::WouldBlock`].
    pub fn is_would_block(&self) -> bool {
        self.kind() == ErrorKind::WouldBlock
    }

    /// Returns true for [`ErrorKind::NotImplemented`].
    pub fn is_not_implemented(&self) -> bool {
        self.kind() == ErrorKind::NotImplemented
    }

    /// Returns true for [`ErrorKind::Eof`].
    pub fn is_eof(&self) -> bool {
        self.kind() == ErrorKind::Eof
    }

    /// Returns true when the same call may succeed later without any state
    /// having changed.
    pub fn is_retryable(&self) -> bool {
        self.is_would_block()
    }

    /// Wraps a failure with `message`, keeping `self` as the cause.
    ///
    /// Signals that callers rely on to retry or terminate (`WouldBlock`,
    /// `NotImplemented`, EOF, invalid arguments) are returned unchanged.
    pub fn context(self, message: impl Into<String>) -> Self {
        match self.kind() {
            ErrorKind::Failed => BucketError::Failed {
                message: message.into(),
                source: Some(Box::new(self)),
            },
            _ => self,
        }
    }
}

impl From<io::Error> for BucketError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock => BucketError::WouldBlock,
            _ => BucketError::Io(e),
        }
    }
}

impl From<BucketError> for io::Error {
    fn from(e: BucketError) -> Self {
        match e {
            BucketError::WouldBlock => io::ErrorKind::WouldBlock.into(),
            BucketError::Io(e) => e,
            BucketError::UnexpectedEof { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            BucketError::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            BucketError::NotImplemented { .. } => io::Error::new(io::ErrorKind::Unsupported, e),
            other => io::Error::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BucketError::not_implemented("memory", "reset").kind(),
            ErrorKind::NotImplemented
        );
        assert_eq!(BucketError::WouldBlock.kind(), ErrorKind::WouldBlock);
        assert_eq!(
            BucketError::UnexpectedEof { bucket: "take" }.kind(),
            ErrorKind::Eof
        );
        assert_eq!(
            BucketError::invalid_argument("requested must be > 0").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(BucketError::failed("boom").kind(), ErrorKind::Failed);
    }

    #[test]
    fn test_error_display() {
        let err = BucketError::not_implemented("pipe", "duplicate");
        assert_eq!(err.to_string(), "duplicate not implemented on pipe bucket");

        let err = BucketError::UnexpectedEof { bucket: "take" };
        assert_eq!(err.to_string(), "unexpected eof in take bucket");
    }

    #[test]
    fn test_io_would_block_is_not_a_failure() {
        let err: BucketError = io::Error::from(io::ErrorKind::WouldBlock).into();
        assert!(err.is_would_block());
        assert!(err.is_retryable());

        let err: BucketError = io::Error::other("disk on fire").into();
        assert_eq!(err.kind(), ErrorKind::Failed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_context_keeps_cause() {
        let inner = BucketError::failed("short read");
        let outer = inner.context("reading header");
        assert_eq!(outer.to_string(), "reading header");
        let source = outer.source().expect("cause kept");
        assert_eq!(source.to_string(), "short read");
    }

    #[test]
    fn test_context_passes_signals_through() {
        assert!(BucketError::WouldBlock.context("x").is_would_block());
        assert!(
            BucketError::not_implemented("file", "reset")
                .context("x")
                .is_not_implemented()
        );
        assert!(
            BucketError::UnexpectedEof { bucket: "take" }
                .context("x")
                .is_eof()
        );
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = BucketError::WouldBlock.into();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        let err: io::Error = BucketError::UnexpectedEof { bucket: "take" }.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
