//! Pipeline assembly and the line loop.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use sluice_bucket::{Bucket, BucketConfig, BucketExt, EolSet, EolState, Scratch};
use sluice_buckets::{Base64DecodeBucket, FileBucket, StreamBucket, TakeBucket};
use tracing::debug;

/// How the source is wrapped before lines are read.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub base64: bool,
    pub skip: u64,
    pub take: Option<u64>,
}

impl Pipeline {
    /// Opens `path` (`-` for stdin) and wraps it.
    pub fn open(
        &self,
        path: &str,
        config: &BucketConfig,
        scratch: &Scratch,
    ) -> anyhow::Result<Box<dyn Bucket>> {
        let source: Box<dyn Bucket> = if path == "-" {
            debug!("reading stdin");
            Box::new(StreamBucket::with_config(std::io::stdin(), config))
        } else {
            Box::new(FileBucket::open_with(Path::new(path), config)?)
        };
        self.wrap(source, scratch)
    }

    /// Applies decoding, skipping and the length limit, in that order.
    pub fn wrap(
        &self,
        source: Box<dyn Bucket>,
        scratch: &Scratch,
    ) -> anyhow::Result<Box<dyn Bucket>> {
        let mut bucket: Box<dyn Bucket> = if self.base64 {
            Box::new(Base64DecodeBucket::new(source))
        } else {
            source
        };

        let mut left = self.skip;
        while left > 0 {
            let step = usize::try_from(left).unwrap_or(usize::MAX);
            let n = bucket.read_skip(step, scratch).context("skip input")?;
            if n == 0 {
                break;
            }
            left -= n as u64;
        }
        if left > 0 {
            debug!(short = left, "input ended while skipping");
        }

        let bucket: Box<dyn Bucket> = match self.take {
            Some(limit) => Box::new(TakeBucket::new(bucket, limit)),
            None => bucket,
        };
        Ok(bucket)
    }
}

/// Totals gathered by [`copy_lines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines: u64,
    pub bytes: u64,
    /// Lines cut at the maximum length.
    pub truncated: u64,
}

/// Reads `bucket` line by line, writing every line to `out` when given.
pub fn copy_lines<B: Bucket + ?Sized>(
    bucket: &mut B,
    eol: EolSet,
    max_line: usize,
    scratch: &Scratch,
    mut out: Option<&mut dyn Write>,
) -> anyhow::Result<Stats> {
    let mut state = EolState::new();
    let mut stats = Stats::default();
    loop {
        let scope = scratch.scope();
        let (line, found) = bucket.read_line(eol, &mut state, max_line, &scope)?;
        if line.is_empty() {
            return Ok(stats);
        }
        stats.lines += 1;
        stats.bytes += line.len() as u64;
        if state.was_cut() {
            stats.truncated += 1;
        }
        if let Some(out) = out.as_deref_mut() {
            out.write_all(&line)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_buckets::MemoryBucket;

    fn source(text: &'static str) -> Box<dyn Bucket> {
        Box::new(MemoryBucket::from(text))
    }

    #[test]
    fn test_copy_lines_counts_and_copies() {
        let scratch = Scratch::new();
        let mut b = MemoryBucket::from("one\ntwo\r\nthree");
        let mut out = Vec::new();
        let sink: &mut dyn Write = &mut out;
        let stats = copy_lines(&mut b, EolSet::LF, 1024, &scratch, Some(sink)).unwrap();
        assert_eq!(out, b"one\ntwo\r\nthree");
        assert_eq!(
            stats,
            Stats {
                lines: 3,
                bytes: 14,
                truncated: 0
            }
        );
    }

    #[test]
    fn test_long_lines_are_cut() {
        let scratch = Scratch::new();
        let mut b = MemoryBucket::from("abcdefgh\nij\n");
        let stats = copy_lines(&mut b, EolSet::LF, 4, &scratch, None).unwrap();
        // "abcd", "efgh", "\n", "ij\n"
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.truncated, 2);
        assert_eq!(stats.bytes, 12);
    }

    #[test]
    fn test_cut_before_crlf_counts_once() {
        let scratch = Scratch::new();
        let mut b = MemoryBucket::from("abc\r\nd");
        let mut out = Vec::new();
        let sink: &mut dyn Write = &mut out;
        let stats = copy_lines(&mut b, EolSet::CRLF, 4, &scratch, Some(sink)).unwrap();
        // "abc", "\r\n", "d": the terminator is never split.
        assert_eq!(out, b"abc\r\nd");
        assert_eq!(
            stats,
            Stats {
                lines: 3,
                bytes: 6,
                truncated: 1
            }
        );
    }

    #[test]
    fn test_stream_source() {
        let scratch = Scratch::new();
        let config = BucketConfig::new().with_file_buffer_size(3);
        let input = std::io::Cursor::new(b"a\nbb\nccc".to_vec());
        let src = StreamBucket::with_config(input, &config);
        let mut b = Pipeline::default().wrap(Box::new(src), &scratch).unwrap();
        let stats = copy_lines(&mut b, EolSet::LF, 64, &scratch, None).unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.bytes, 8);
    }

    #[test]
    fn test_wrap_decodes_skips_and_takes() {
        let scratch = Scratch::new();
        let pipeline = Pipeline {
            base64: true,
            skip: 4,
            take: Some(9),
        };
        // "GET / HTTP/1.1\r\nHost: x\r\n\r\n"
        let src = source("R0VUIC8gSFRUUC8xLjENCkhvc3Q6IHgNCg0K");
        let mut b = pipeline.wrap(src, &scratch).unwrap();
        assert_eq!(b.read_to_vec(&scratch).unwrap(), b"/ HTTP/1.");
    }

    #[test]
    fn test_skip_past_end() {
        let scratch = Scratch::new();
        let pipeline = Pipeline {
            skip: 100,
            ..Pipeline::default()
        };
        let mut b = pipeline.wrap(source("short"), &scratch).unwrap();
        assert!(b.read_to_vec(&scratch).unwrap().is_empty());
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"a\r\nb\r\n").unwrap();
        drop(f);

        let scratch = Scratch::new();
        let config = BucketConfig::new().with_file_buffer_size(2);
        let mut b = Pipeline::default()
            .open(path.to_str().unwrap(), &config, &scratch)
            .unwrap();
        let stats = copy_lines(&mut b, EolSet::CRLF, 16, &scratch, None).unwrap();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.bytes, 6);

        let missing = dir.path().join("missing.txt");
        assert!(
            Pipeline::default()
                .open(missing.to_str().unwrap(), &config, &scratch)
                .is_err()
        );
    }
}
