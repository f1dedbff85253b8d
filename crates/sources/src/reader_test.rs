//! Line reader tests

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};

use crate::common::SourceMetrics;
use crate::reader::{LineReader, ReadLineResult, read_bounded_line};
use crate::traits::LineSource;

fn reader_over(data: &'static [u8], max: usize) -> LineReader<BufReader<&'static [u8]>> {
    LineReader::new(BufReader::new(data), max)
}

// ============================================================================
// Bounded Line Tests
// ============================================================================

#[tokio::test]
async fn test_bounded_line_strips_newline() {
    let mut reader = BufReader::new(&b"hello\nworld\n"[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
    assert_eq!(result, ReadLineResult::Line(6));
    assert_eq!(buf, b"hello");

    let result = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
    assert_eq!(result, ReadLineResult::Line(6));
    assert_eq!(buf, b"world");
}

#[tokio::test]
async fn test_bounded_line_too_long() {
    let mut reader = BufReader::new(&b"0123456789\nok\n"[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 4).await.unwrap();
    assert_eq!(result, ReadLineResult::TooLong(11));
    assert!(buf.is_empty());

    let result = read_bounded_line(&mut reader, &mut buf, 4).await.unwrap();
    assert_eq!(result, ReadLineResult::Line(3));
    assert_eq!(buf, b"ok");
}

#[tokio::test]
async fn test_bounded_line_exact_limit() {
    let mut reader = BufReader::new(&b"abcd\n"[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 4).await.unwrap();
    assert_eq!(result, ReadLineResult::Line(5));
    assert_eq!(buf, b"abcd");
}

#[tokio::test]
async fn test_bounded_line_small_read_buffer() {
    // Line spans several fill_buf() calls
    let mut reader = BufReader::with_capacity(2, &b"abcdefgh\nz\n"[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
    assert_eq!(result, ReadLineResult::Line(9));
    assert_eq!(buf, b"abcdefgh");
}

#[tokio::test]
async fn test_bounded_line_eof_partial() {
    let mut reader = BufReader::new(&b"no newline"[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
    assert_eq!(result, ReadLineResult::Eof { partial: 10 });
    assert_eq!(buf, b"no newline");
}

#[tokio::test]
async fn test_bounded_line_eof_empty() {
    let mut reader = BufReader::new(&b""[..]);
    let mut buf = Vec::new();

    let result = read_bounded_line(&mut reader, &mut buf, 64).await.unwrap();
    assert_eq!(result, ReadLineResult::Eof { partial: 0 });
}

// ============================================================================
// LineReader Tests
// ============================================================================

#[tokio::test]
async fn test_read_line_strips_crlf() {
    let mut reader = reader_over(b"a\tb\r\nc\n", 64);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("a\tb"));
    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("c"));
    assert_eq!(reader.read_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_read_line_empty_line() {
    let mut reader = reader_over(b"\nnext\n", 64);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some(""));
    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("next"));
}

#[tokio::test]
async fn test_read_line_skips_oversized() {
    let mut reader = reader_over(b"this line is far too long\nshort\n", 8);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("short"));
    assert_eq!(reader.read_line().await.unwrap(), None);

    let snapshot = reader.metrics().snapshot();
    assert_eq!(snapshot.lines_read, 1);
    assert_eq!(snapshot.lines_oversized, 1);
}

#[tokio::test]
async fn test_read_line_discards_unterminated_tail() {
    let mut reader = reader_over(b"complete\npartial", 64);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("complete"));
    assert_eq!(reader.read_line().await.unwrap(), None);
    assert_eq!(reader.metrics().snapshot().lines_read, 1);
}

#[tokio::test]
async fn test_read_line_keeps_unterminated_tail_when_enabled() {
    let mut reader = reader_over(b"complete\npartial\r", 64).with_trailing_line(true);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("complete"));
    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("partial"));
    assert_eq!(reader.read_line().await.unwrap(), None);
    assert_eq!(reader.metrics().snapshot().lines_read, 2);
}

#[tokio::test]
async fn test_read_line_oversized_tail_skipped_when_enabled() {
    let mut reader = reader_over(b"ok\nthis tail is far too long", 8).with_trailing_line(true);

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("ok"));
    assert_eq!(reader.read_line().await.unwrap(), None);

    let snapshot = reader.metrics().snapshot();
    assert_eq!(snapshot.lines_read, 1);
    assert_eq!(snapshot.lines_oversized, 1);
}

#[tokio::test]
async fn test_read_line_invalid_utf8_is_lossy() {
    let mut reader = reader_over(b"ok\xff\xfe\nnext\n", 64);

    let line = reader.read_line().await.unwrap().unwrap();
    assert!(line.starts_with("ok"));
    assert!(line.contains('\u{FFFD}'));
    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("next"));
}

#[tokio::test]
async fn test_read_line_metrics_bytes() {
    let metrics = Arc::new(SourceMetrics::new());
    let mut reader = LineReader::with_metrics(BufReader::new(&b"abc\r\nde\n"[..]), 64, Arc::clone(&metrics));

    while reader.read_line().await.unwrap().is_some() {}

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.lines_read, 2);
    assert_eq!(snapshot.bytes_read, 8);
}

#[tokio::test]
async fn test_read_line_over_duplex_stream() {
    let (client, mut server) = tokio::io::duplex(64);
    let mut reader = LineReader::new(BufReader::new(client), 64);

    let writer = tokio::spawn(async move {
        server.write_all(b"first\nsec").await.unwrap();
        server.write_all(b"ond\n").await.unwrap();
    });

    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("first"));
    assert_eq!(reader.read_line().await.unwrap().as_deref(), Some("second"));

    writer.await.unwrap();
    assert_eq!(reader.read_line().await.unwrap(), None);
}

// ============================================================================
// LineSource Tests
// ============================================================================

#[tokio::test]
async fn test_line_source_impl() {
    let mut source = reader_over(b"one\n", 64).with_name("stdin");

    assert_eq!(source.name(), "stdin");
    assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
    assert_eq!(source.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_line_source_reconnect_unsupported() {
    let mut source = reader_over(b"", 64);
    assert!(!source.can_reconnect());

    let err = source.reconnect().await.unwrap_err();
    assert!(!err.is_reconnectable());
}
