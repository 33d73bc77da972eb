//! Tests for text sanitization

use super::{clean_string, process_text};

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(process_text(b"hello world").unwrap(), "hello world");
}

#[test]
fn test_bom_trimmed_with_whitespace() {
    assert_eq!(
        process_text(b"\xEF\xBB\xBF An application event log entry...").unwrap(),
        "An application event log entry..."
    );
}

#[test]
fn test_bom_without_following_content_kept() {
    // A packet that is exactly a BOM is not treated as BOM + empty message.
    assert_eq!(process_text(b"\xEF\xBB\xBF").unwrap(), "\u{feff}");
}

#[test]
fn test_terminal_codes_unescaped() {
    let input = b"#033[32mdebug#033[0m plain";
    assert_eq!(process_text(input).unwrap(), "\x1b[32mdebug\x1b[0m plain");
}

#[test]
fn test_trailing_escape_prefix_kept() {
    // A bare "#033" with no CSI body is not a terminal code.
    assert_eq!(process_text(b"Encountered err #033").unwrap(), "Encountered err #033");
}

#[test]
fn test_control_chars_unescaped() {
    assert_eq!(process_text(b"a#011b#012c#015d").unwrap(), "a\tb\nc\rd");
}

#[test]
fn test_nul_truncates() {
    assert_eq!(process_text(b"abc\x00def").unwrap(), "abc");
}

#[test]
fn test_leading_nul_is_corrupted() {
    assert!(process_text(b"\x00abc").is_none());
}

#[test]
fn test_clean_string_strips_backslashes() {
    assert_eq!(clean_string(r#"App\"lication\]"#, false), "App\"lication]");
    assert_eq!(clean_string("plain", false), "plain");
}

#[test]
fn test_clean_string_unquotes() {
    assert_eq!(clean_string("\"professional plus\"", true), "professional plus");
    assert_eq!(clean_string("unquoted", true), "unquoted");
}
