//! Behavior every bucket kind shares, checked across kinds.

use std::io::{Cursor, IoSlice, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sluice_bucket::{
    Bucket, BucketConfig, BucketExt, Eol, EolSet, EolState, READ_ALL, Scratch, Span,
};
use sluice_buckets::{
    AggregateBucket, Base64DecodeBucket, FileBucket, MemoryBucket, StreamBucket, TakeBucket, pipe,
};

const TEXT: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";

/// Builds one bucket per kind, each yielding `data`.
fn kinds(dir: &tempfile::TempDir, data: &[u8]) -> Vec<(&'static str, Box<dyn Bucket>)> {
    let path = dir.path().join("text");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(data).unwrap();
    f.sync_all().unwrap();

    let third = data.len() / 3;
    let mut agg = AggregateBucket::new();
    agg.append(MemoryBucket::copy_from_slice(&data[..third]));
    agg.append(MemoryBucket::copy_from_slice(&data[third..2 * third]));
    agg.append(MemoryBucket::copy_from_slice(&data[2 * third..]));

    let mut padded = data.to_vec();
    padded.extend_from_slice(b"trailing");

    let encoded = STANDARD.encode(data);

    let (writer, piped) = pipe();
    writer.write(data).unwrap();
    writer.close();

    let config = BucketConfig::new().with_file_buffer_size(5);
    vec![
        ("memory", boxed(MemoryBucket::copy_from_slice(data))),
        ("file", boxed(FileBucket::open_with(&path, &config).unwrap())),
        ("aggregate", boxed(agg)),
        (
            "take",
            boxed(TakeBucket::new(MemoryBucket::new(padded), data.len() as u64)),
        ),
        (
            "base64",
            boxed(Base64DecodeBucket::new(MemoryBucket::new(encoded.into_bytes()))),
        ),
        ("pipe", boxed(piped)),
        (
            "stream",
            boxed(StreamBucket::with_config(Cursor::new(data.to_vec()), &config)),
        ),
    ]
}

fn boxed(bucket: impl Bucket + 'static) -> Box<dyn Bucket> {
    Box::new(bucket)
}

#[test]
fn test_every_kind_yields_the_text() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        assert_eq!(b.read_to_vec(&scratch).unwrap(), TEXT, "{name}");
    }
}

#[test]
fn test_eof_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        b.drain(&scratch).unwrap();
        for _ in 0..3 {
            assert_eq!(b.read(READ_ALL, &scratch).unwrap(), Span::EOF, "{name}");
            assert_eq!(b.read_skip(READ_ALL, &scratch).unwrap(), 0, "{name}");
        }
    }
}

#[test]
fn test_zero_requested_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        assert_eq!(
            b.read(0, &scratch).unwrap_err().kind(),
            sluice_bucket::ErrorKind::InvalidArgument,
            "{name}"
        );
        assert_eq!(b.read_to_vec(&scratch).unwrap(), TEXT, "{name}");
    }
}

#[test]
fn test_duplicate_yields_identical_data() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        b.read_skip(3, &scratch).unwrap();
        let mut dup = match b.duplicate(&scratch) {
            Ok(dup) => dup,
            Err(e) if e.is_not_implemented() => continue,
            Err(e) => panic!("{name}: {e}"),
        };
        let original = b.read_to_vec(&scratch).unwrap();
        let copied = dup.read_to_vec(&scratch).unwrap();
        assert_eq!(original, copied, "{name}");
    }
}

#[test]
fn test_peek_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        b.read(2, &scratch).unwrap();
        let first = b.peek(false, &scratch).unwrap();
        let (first, first_eof) = (first.to_vec(), first.is_eof());
        let second = b.peek(false, &scratch).unwrap();
        assert_eq!(second.as_bytes(), first.as_slice(), "{name}");
        assert_eq!(second.is_eof(), first_eof, "{name}");

        // Peeked data is what a read returns next.
        if !first.is_empty() {
            let span = b.read(first.len(), &scratch).unwrap();
            assert_eq!(span.as_bytes(), first.as_slice(), "{name}");
        }
    }
}

#[test]
fn test_skip_matches_read() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    let read_side = kinds(&dir, TEXT);
    let skip_side = kinds(&dir, TEXT);
    for ((name, mut r), (_, mut s)) in read_side.into_iter().zip(skip_side) {
        let consumed = r.read(4, &scratch).unwrap().len();
        assert_eq!(s.read_skip(4, &scratch).unwrap(), consumed, "{name}");
        assert_eq!(
            r.read_to_vec(&scratch).unwrap(),
            s.read_to_vec(&scratch).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn test_single_slot_iovec_matches_read() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    let read_side = kinds(&dir, TEXT);
    let iovec_side = kinds(&dir, TEXT);
    for ((name, mut r), (_, mut v)) in read_side.into_iter().zip(iovec_side) {
        let expected = r.read(6, &scratch).unwrap().to_vec();
        let mut vecs = [IoSlice::new(&[])];
        let got = v.read_iovec(6, &mut vecs, &scratch).unwrap();
        assert_eq!(got.used, 1, "{name}");
        assert_eq!(&*vecs[0], expected.as_slice(), "{name}");
    }
}

#[test]
fn test_failed_capability_keeps_remaining() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        b.read(3, &scratch).unwrap();
        let before = b.read_remaining_bytes(&scratch);
        let can_reset = b.can_reset();
        match b.reset(&scratch) {
            Ok(()) => assert!(can_reset, "{name}"),
            Err(e) => {
                assert!(e.is_not_implemented(), "{name}");
                let after = b.read_remaining_bytes(&scratch);
                assert_eq!(before.ok(), after.ok(), "{name}");
            }
        }
    }
}

#[test]
fn test_crlf_and_none_line_reads() {
    let scratch = Scratch::new();

    let mut b = MemoryBucket::from("abc\r\ndef");
    let (span, eol) = b
        .read_until_newline(EolSet::CRLF, READ_ALL, &scratch)
        .unwrap();
    assert_eq!(span.as_bytes(), b"abc\r\n");
    assert_eq!(eol, Eol::CrLf);

    let mut b = MemoryBucket::from("abc\r\ndef");
    let (span, eol) = b.read_until_newline(EolSet::NONE, 4, &scratch).unwrap();
    assert_eq!(span.as_bytes(), b"abc\r");
    assert_eq!(eol, Eol::None);
}

#[test]
fn test_http_request_lines_for_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        let mut state = EolState::new();
        let mut lines = Vec::new();
        loop {
            let (line, eol) = b
                .read_line(EolSet::CRLF, &mut state, 1024, &scratch)
                .unwrap();
            if line.is_empty() {
                break;
            }
            assert_eq!(eol, Eol::CrLf, "{name}");
            lines.push(line);
        }
        assert_eq!(
            lines,
            vec![&b"GET / HTTP/1.1\r\n"[..], b"Host: x\r\n", b"\r\n"],
            "{name}"
        );
        assert_eq!(b.read(READ_ALL, &scratch).unwrap(), Span::EOF, "{name}");
    }
}

#[test]
fn test_long_run_of_cr_is_one_line_for_every_kind() {
    let mut data = vec![b'x'];
    data.resize(150_001, b'\r');
    data.push(b'\n');

    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, &data) {
        let mut state = EolState::new();
        let (line, eol) = b
            .read_line(EolSet::CRLF, &mut state, data.len(), &scratch)
            .unwrap();
        assert_eq!(eol, Eol::CrLf, "{name}");
        assert_eq!(line.len(), data.len(), "{name}");
        assert!(!state.was_cut(), "{name}");
        let (rest, _) = b
            .read_line(EolSet::CRLF, &mut state, data.len(), &scratch)
            .unwrap();
        assert!(rest.is_empty(), "{name}");
    }
}

#[test]
fn test_final_data_then_empty_eof_for_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = Scratch::new();
    for (name, mut b) in kinds(&dir, TEXT) {
        let mut total = 0;
        loop {
            let span = b.read(READ_ALL, &scratch).unwrap();
            if span.is_eof() {
                assert!(span.is_empty(), "{name}");
                break;
            }
            total += span.len();
        }
        assert_eq!(total, TEXT.len(), "{name}");
    }
}
