//! Bucket over any [`std::io::Read`] source, such as stdin or a socket.

use std::io::{self, Read};

use sluice_bucket::{Bucket, BucketConfig, BucketError, BucketType, Result, Scratch, Span};
use tracing::{debug, trace};

use crate::check_requested;

const STREAM: BucketType = BucketType::new("stream");

/// A bucket reading a byte stream through a private buffer.
///
/// The source is read only when the buffer is empty, at most one buffer's
/// worth at a time. A source returning [`io::ErrorKind::WouldBlock`] makes
/// the bucket report `WouldBlock`; `Interrupted` reads are retried. Streams
/// cannot be rewound, so reset and duplicate are not implemented.
pub struct StreamBucket<R> {
    reader: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// Bytes handed out so far.
    pos: u64,
    /// The source returned end of stream.
    done: bool,
}

impl<R: Read + Send> StreamBucket<R> {
    /// Type tag of [`StreamBucket`].
    pub const TYPE: BucketType = STREAM;

    /// Wraps `reader` with the default buffer size.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &BucketConfig::default())
    }

    /// Wraps `reader`, sizing the buffer from `config.file_buffer_size`.
    pub fn with_config(reader: R, config: &BucketConfig) -> Self {
        StreamBucket {
            reader,
            buf: vec![0; config.file_buffer_size.max(1)],
            start: 0,
            end: 0,
            pos: 0,
            done: false,
        }
    }

    /// Returns a reference to the source.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the source. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn buffered(&self) -> usize {
        self.end - self.start
    }

    /// Refills the empty buffer. Returns false at end of stream.
    fn fill(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let n = loop {
            match self.reader.read(&mut self.buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Err(BucketError::WouldBlock);
                }
                Err(e) => {
                    let context = format!("read stream at {}", self.pos);
                    return Err(BucketError::from(e).context(context));
                }
                Ok(n) => break n,
            }
        };
        trace!(pos = self.pos, n, "stream bucket refill");
        self.start = 0;
        self.end = n;
        if n == 0 {
            debug!(pos = self.pos, "stream bucket reached end");
            self.done = true;
        }
        Ok(n > 0)
    }
}

impl<R: Read + Send> Bucket for StreamBucket<R> {
    fn read(&mut self, requested: usize, _scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        if self.buffered() == 0 && !self.fill()? {
            return Ok(Span::EOF);
        }
        let n = requested.min(self.buffered());
        let start = self.start;
        self.start += n;
        self.pos += n as u64;
        Ok(Span::new(&self.buf[start..start + n]))
    }

    fn peek(&mut self, no_poll: bool, _scratch: &Scratch) -> Result<Span<'_>> {
        if self.buffered() == 0 {
            if self.done {
                return Ok(Span::EOF);
            }
            if no_poll {
                return Ok(Span::EMPTY);
            }
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return Ok(Span::EOF),
                Err(e) if e.is_would_block() => return Ok(Span::EMPTY),
                Err(e) => return Err(e),
            }
        }
        Ok(Span::new(&self.buf[self.start..self.end]))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&STREAM)
    }

    fn position(&self) -> Option<u64> {
        Some(self.pos)
    }
}

impl<R> std::fmt::Debug for StreamBucket<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBucket")
            .field("pos", &self.pos)
            .field("buffered", &(self.end - self.start))
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use sluice_bucket::{BucketExt, Eol, EolSet, EolState, ErrorKind, READ_ALL};

    fn small() -> BucketConfig {
        BucketConfig::new().with_file_buffer_size(4)
    }

    /// Replays scripted results, then end of stream.
    struct Script {
        steps: Vec<io::Result<Vec<u8>>>,
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.steps.is_empty() {
                return Ok(0);
            }
            let data = self.steps.remove(0)?;
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        }
    }

    fn script(steps: Vec<io::Result<&[u8]>>) -> Script {
        Script {
            steps: steps.into_iter().map(|s| s.map(<[u8]>::to_vec)).collect(),
        }
    }

    #[test]
    fn test_reads_through_small_buffer() {
        let scratch = Scratch::new();
        let source = Cursor::new(b"the quick brown fox".to_vec());
        let mut b = StreamBucket::with_config(source, &small());
        let span = b.read(READ_ALL, &scratch).unwrap();
        assert_eq!(span.as_bytes(), b"the ");
        assert!(!span.is_eof());
        assert_eq!(b.read_to_vec(&scratch).unwrap(), b"quick brown fox");
        assert_eq!(b.read(READ_ALL, &scratch).unwrap(), Span::EOF);
        assert_eq!(b.position(), Some(19));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let scratch = Scratch::new();
        let mut b = StreamBucket::with_config(Cursor::new(b"abcdef".to_vec()), &small());
        assert_eq!(b.peek(true, &scratch).unwrap(), Span::EMPTY);
        assert_eq!(b.peek(false, &scratch).unwrap().as_bytes(), b"abcd");
        assert_eq!(b.read(3, &scratch).unwrap().as_bytes(), b"abc");
        assert_eq!(b.peek(true, &scratch).unwrap().as_bytes(), b"d");
        assert_eq!(b.read_to_vec(&scratch).unwrap(), b"def");
        assert!(b.peek(false, &scratch).unwrap().is_eof());
    }

    #[test]
    fn test_line_reads() {
        let scratch = Scratch::new();
        let source = Cursor::new(b"one\r\ntwo\r\nx".to_vec());
        let mut b = StreamBucket::with_config(source, &small());
        let mut state = EolState::new();
        let mut lines = Vec::new();
        loop {
            let (line, eol) = b.read_line(EolSet::CRLF, &mut state, 64, &scratch).unwrap();
            if line.is_empty() {
                break;
            }
            lines.push((line.to_vec(), eol));
        }
        assert_eq!(
            lines,
            vec![
                (b"one\r\n".to_vec(), Eol::CrLf),
                (b"two\r\n".to_vec(), Eol::CrLf),
                (b"x".to_vec(), Eol::None),
            ]
        );
    }

    #[test]
    fn test_would_block_and_interrupted() {
        let scratch = Scratch::new();
        let reader = script(vec![
            Err(io::ErrorKind::WouldBlock.into()),
            Err(io::ErrorKind::Interrupted.into()),
            Ok(&b"ab"[..]),
        ]);
        let mut b = StreamBucket::new(reader);
        assert!(b.read(READ_ALL, &scratch).unwrap_err().is_would_block());
        assert_eq!(b.read(READ_ALL, &scratch).unwrap().as_bytes(), b"ab");
        assert_eq!(b.read(READ_ALL, &scratch).unwrap(), Span::EOF);
    }

    #[test]
    fn test_peek_never_blocks() {
        let scratch = Scratch::new();
        let reader = script(vec![Err(io::ErrorKind::WouldBlock.into()), Ok(&b"z"[..])]);
        let mut b = StreamBucket::new(reader);
        assert_eq!(b.peek(false, &scratch).unwrap(), Span::EMPTY);
        assert_eq!(b.peek(false, &scratch).unwrap().as_bytes(), b"z");
    }

    #[test]
    fn test_source_error_is_failure() {
        let scratch = Scratch::new();
        let reader = script(vec![Ok(&b"ok"[..]), Err(io::Error::other("broken"))]);
        let mut b = StreamBucket::new(reader);
        assert_eq!(b.read(READ_ALL, &scratch).unwrap().as_bytes(), b"ok");
        let err = b.read(READ_ALL, &scratch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Failed);
    }

    #[test]
    fn test_cannot_rewind() {
        let scratch = Scratch::new();
        let mut b = StreamBucket::new(Cursor::new(b"abc".to_vec()));
        assert!(!b.can_reset());
        assert!(b.reset(&scratch).unwrap_err().is_not_implemented());
        assert!(b.duplicate(&scratch).err().unwrap().is_not_implemented());
        assert_eq!(b.name(), "stream");
    }
}
