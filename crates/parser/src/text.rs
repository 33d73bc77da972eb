//! Message text sanitization.
//!
//! Syslog forwarders escape control characters as `#NNN` octal sequences.
//! This module unescapes the ones we care about (ESC for terminal color
//! codes, TAB/LF/CR), trims UTF-8 BOMs, and truncates at NUL bytes.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Escaped terminal control sequences: `#033` followed by a CSI body.
static TERM_CODES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#033[\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-PRZcf-nqry=><]").unwrap()
});

/// Escaped TAB (`#011`), LF (`#012`) and CR (`#015`).
static ESCAPED_CTRL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"#01[125]").unwrap());

/// Sanitize a message body: BOM trim, control-code unescaping, NUL
/// truncation. Returns `None` when the first sanitized byte is NUL, which
/// marks the whole packet as corrupted.
pub(crate) fn process_text(data: &[u8]) -> Option<String> {
    let mut trimmed = Cow::Borrowed(trim_bom(data));

    if contains(&trimmed, b"#033") {
        // Unescape ESC so downstream terminal-code filters work on the real
        // control bytes.
        let replaced = TERM_CODES.replace_all(&trimmed, |caps: &regex::bytes::Captures| {
            let code = &caps[0];
            let mut out = Vec::with_capacity(code.len() - 3);
            out.push(0x1b);
            out.extend_from_slice(&code[4..]);
            out
        });
        trimmed = Cow::Owned(replaced.into_owned());
    }

    if let Some(idx) = find(&trimmed, b"#01") {
        if idx + 3 < trimmed.len() {
            let replaced = ESCAPED_CTRL_CHARS.replace_all(&trimmed, |caps: &regex::bytes::Captures| {
                match caps[0][3] {
                    b'1' => &b"\t"[..],
                    b'2' => &b"\n"[..],
                    _ => &b"\r"[..],
                }
            });
            trimmed = Cow::Owned(replaced.into_owned());
        }
    }

    // Truncate past the first NUL byte; a leading NUL poisons the packet.
    if let Some(idx) = trimmed.iter().position(|&b| b == 0) {
        if idx == 0 {
            return None;
        }
        return Some(String::from_utf8_lossy(&trimmed[..idx]).into_owned());
    }

    Some(String::from_utf8_lossy(&trimmed).into_owned())
}

/// Strip a UTF-8 BOM and, when one was present, surrounding whitespace.
fn trim_bom(data: &[u8]) -> &[u8] {
    if data.len() > 3 && data[0] == 0xef && data[1] == 0xbb && data[2] == 0xbf {
        data[3..].trim_ascii()
    } else {
        data
    }
}

/// Remove backslashes; optionally unwrap a surrounding pair of double quotes
/// first.
pub(crate) fn clean_string(s: &str, unquote: bool) -> String {
    let s = if unquote { maybe_unquote(s) } else { s };
    if s.contains('\\') {
        s.chars().filter(|&c| c != '\\').collect()
    } else {
        s.to_string()
    }
}

fn maybe_unquote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;
