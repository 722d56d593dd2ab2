//! Unit tests for the ODBC binding that need no driver manager

use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::driver::{MESSAGE_BUFFER_LEN, decode_message, long_length, short_length};
use crate::{DriverLoadError, OdbcDriver, library_candidates};

#[test]
fn test_library_candidates_for_platform() {
    let candidates = library_candidates();
    assert!(!candidates.is_empty());

    #[cfg(target_os = "linux")]
    assert_eq!(candidates, ["libodbc.so.2", "libodbc.so", "libiodbc.so.2"]);
}

#[test]
fn test_load_missing_library_fails() {
    let path = Path::new("/nonexistent/odbctap/libodbc-missing.so");

    let err = OdbcDriver::load(Some(path))
        .err()
        .expect("a missing library cannot load");

    match &err {
        DriverLoadError::Library { path, .. } => {
            assert_eq!(path, "/nonexistent/odbctap/libodbc-missing.so")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with(
        "failed to load driver manager '/nonexistent/odbctap/libodbc-missing.so': "
    ));
}

#[test]
fn test_not_found_lists_every_candidate() {
    let err = DriverLoadError::NotFound {
        tried: vec!["libodbc.so.2".to_string(), "libiodbc.so.2".to_string()],
    };

    assert_eq!(
        err.to_string(),
        "no ODBC driver manager found (tried libodbc.so.2, libiodbc.so.2)"
    );
}

#[rstest]
#[case::empty("", Some(0))]
#[case::dsn("test", Some(4))]
#[case::limit(&"x".repeat(i16::MAX as usize), Some(i16::MAX))]
#[case::too_long(&"x".repeat(i16::MAX as usize + 1), None)]
fn test_short_length(#[case] text: &str, #[case] expected: Option<i16>) {
    assert_eq!(short_length(text), expected);
}

#[test]
fn test_long_length_counts_bytes() {
    assert_eq!(long_length("SELECT 'é'"), Some(11));
}

#[rstest]
#[case::exact(b"syntax error\0\0\0\0".as_slice(), 12, "syntax error")]
#[case::stops_at_nul(b"abc\0def\0".as_slice(), 7, "abc")]
#[case::truncated(b"abcde\0".as_slice(), 40, "abcde")]
#[case::negative_length(b"abc\0".as_slice(), -1, "")]
#[case::invalid_utf8(b"bad \xff byte\0".as_slice(), 10, "bad \u{fffd} byte")]
fn test_decode_message(#[case] buffer: &[u8], #[case] text_len: i16, #[case] expected: &str) {
    assert_eq!(decode_message(buffer, text_len), expected);
}

#[test]
fn test_message_buffer_leaves_room_for_nul() {
    assert_eq!(MESSAGE_BUFFER_LEN, 511);

    let mut buffer = vec![b'x'; MESSAGE_BUFFER_LEN as usize];
    buffer.push(0);
    assert_eq!(decode_message(&buffer, i16::MAX).len(), 511);
}
