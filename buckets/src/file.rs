//! File-backed bucket using positional reads.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sluice_bucket::{Bucket, BucketConfig, BucketError, BucketType, Result, Scratch, Span};
use tracing::{debug, trace};

use crate::check_requested;

/// A bucket reading a file through a private buffer.
///
/// Reads are positional, so duplicates share the open handle and still keep
/// independent positions.
pub struct FileBucket {
    file: Arc<File>,
    path: Option<Arc<PathBuf>>,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// File offset of `buf[start]`.
    pos: u64,
    /// The file returned no more data at `pos`.
    done: bool,
}

impl FileBucket {
    /// Type tag of [`FileBucket`].
    pub const TYPE: BucketType = BucketType::new("file");

    /// Opens `path` with the default buffer size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &BucketConfig::default())
    }

    /// Opens `path`, sizing the buffer from `config`.
    pub fn open_with(path: impl AsRef<Path>, config: &BucketConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| BucketError::from(e).context(format!("open {}", path.display())))?;
        debug!(path = %path.display(), "opened file bucket");
        let mut bucket = Self::from_file_with(file, config);
        bucket.path = Some(Arc::new(path.to_path_buf()));
        Ok(bucket)
    }

    /// Wraps an open file, reading from its start.
    pub fn from_file(file: File) -> Self {
        Self::from_file_with(file, &BucketConfig::default())
    }

    /// Wraps an open file, sizing the buffer from `config`.
    pub fn from_file_with(file: File, config: &BucketConfig) -> Self {
        Self::with_handle(Arc::new(file), None, config.file_buffer_size, 0)
    }

    fn with_handle(file: Arc<File>, path: Option<Arc<PathBuf>>, size: usize, pos: u64) -> Self {
        FileBucket {
            file,
            path,
            buf: vec![0; size.max(1)],
            start: 0,
            end: 0,
            pos,
            done: false,
        }
    }

    /// Returns the path this bucket was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    fn buffered(&self) -> usize {
        self.end - self.start
    }

    fn io_error(&self, e: io::Error) -> BucketError {
        let err = BucketError::from(e);
        match self.path() {
            Some(path) => err.context(format!("read {}", path.display())),
            None => err,
        }
    }

    /// Refills the empty buffer. Returns false at end of file.
    fn fill(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let n = read_at(&self.file, &mut self.buf, self.pos).map_err(|e| self.io_error(e))?;
        trace!(pos = self.pos, n, "file bucket refill");
        self.start = 0;
        self.end = n;
        if n == 0 {
            self.done = true;
        }
        Ok(n > 0)
    }

    fn file_len(&self) -> Result<u64> {
        let meta = self.file.metadata().map_err(|e| self.io_error(e))?;
        Ok(meta.len())
    }
}

impl Bucket for FileBucket {
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
            if !self.fill()? {
                return Ok(Span::EOF);
            }
        }
        Ok(Span::new(&self.buf[self.start..self.end]))
    }

    fn read_skip(&mut self, requested: usize, _scratch: &Scratch) -> Result<usize> {
        check_requested(requested)?;
        if self.buffered() > 0 {
            let n = requested.min(self.buffered());
            self.start += n;
            self.pos += n as u64;
            return Ok(n);
        }
        if self.done {
            return Ok(0);
        }
        let left = self.file_len()?.saturating_sub(self.pos);
        let n = (requested as u64).min(left) as usize;
        if n == 0 {
            self.done = true;
        }
        self.pos += n as u64;
        trace!(pos = self.pos, n, "file bucket skip");
        Ok(n)
    }

    fn read_remaining_bytes(&mut self, _scratch: &Scratch) -> Result<u64> {
        if self.done {
            return Ok(0);
        }
        Ok(self.file_len()?.saturating_sub(self.pos))
    }

    fn reset(&mut self, _scratch: &Scratch) -> Result<()> {
        debug!(from = self.pos, "file bucket reset");
        self.pos = 0;
        self.start = 0;
        self.end = 0;
        self.done = false;
        Ok(())
    }

    fn can_reset(&self) -> bool {
        true
    }

    fn duplicate(&self, _scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        let mut dup = Self::with_handle(
            Arc::clone(&self.file),
            self.path.clone(),
            self.buf.len(),
            self.pos,
        );
        dup.done = self.done && self.buffered() == 0;
        Ok(Box::new(dup))
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&Self::TYPE)
    }

    fn position(&self) -> Option<u64> {
        Some(self.pos)
    }
}

impl std::fmt::Debug for FileBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBucket")
            .field("path", &self.path())
            .field("pos", &self.pos)
            .field("buffered", &self.buffered())
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    loop {
        match file.read_at(buf, offset) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            r => return r,
        }
    }
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    loop {
        match file.seek_read(buf, offset) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            r => return r,
        }
    }
}
