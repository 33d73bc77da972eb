//! Free-form `key=value` metadata extraction.
//!
//! Scans the message text for `=` positions and extracts a key looking
//! backward and a value looking forward. Both sides may be double-quoted;
//! quoted values may contain escaped quotes. Values whose first byte is an
//! ASCII digit are typed as integers or floats.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use siphon_protocol::{LogEvent, MetaValue};

use crate::strconv::{parse_float, parse_int};
use crate::text::clean_string;

/// Accepted key shape: a word character followed by word characters,
/// whitespace, dots or dashes.
static METADATA_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^\w(?:\w|\s|[.-])*$").unwrap());

/// Scan `data` for `key=value` pairs and record them on the event. Existing
/// keys may be overwritten by later matches within the same message.
pub(crate) fn parse_metadata(event: &mut LogEvent, data: &[u8]) {
    let max = data.len();
    if max < 3 {
        return;
    }

    let mut i = 0;
    while i < max {
        // A key needs at least two bytes of room before the '=' and a value
        // needs at least one after it.
        if data[i] == b'=' && i >= 2 && i + 1 < max {
            if let Some(key) = find_key(&data[..i]) {
                if METADATA_KEY.is_match(key) {
                    if let Some(val) = find_val(&data[i + 1..]) {
                        if !val.is_empty() {
                            let key =
                                clean_string(&String::from_utf8_lossy(key), true);
                            event.metadata.insert(key, type_value(val));
                        }
                        i += 1 + val.len();
                        continue;
                    }
                }
            }
        }
        i += 1;
    }
}

/// Walk backwards from the `=` for the key. Quoted keys span to the matching
/// opening quote, bare keys to the previous space or the start of the data.
fn find_key(part: &[u8]) -> Option<&[u8]> {
    let end = part.len() - 1;
    let mut i = end;
    let mut quoted = false;

    match part[i] {
        b' ' => return None,
        b'"' => {
            if i == 0 {
                return None;
            }
            i -= 1;
            quoted = true;
        }
        _ => {}
    }

    loop {
        match part[i] {
            b' ' if !quoted => return Some(&part[i + 1..]),
            b'"' if quoted => return Some(&part[i + 1..end]),
            _ => {}
        }
        if i == 0 {
            return if quoted { None } else { Some(part) };
        }
        i -= 1;
    }
}

/// Walk forwards from the `=` for the value. Quoted values span to the next
/// unescaped quote, bare values to the next space or the end of the data.
fn find_val(part: &[u8]) -> Option<&[u8]> {
    let max = part.len();
    let mut i = 0;
    let mut start = 0;
    let mut quoted = false;

    match part[0] {
        b' ' => return None,
        b'"' => {
            i = 1;
            start = 1;
            quoted = true;
        }
        _ => {}
    }

    while i < max {
        match part[i] {
            b' ' if !quoted => return Some(&part[start..i]),
            b'"' if quoted && i > 0 && part[i - 1] != b'\\' => {
                return Some(&part[start..i]);
            }
            _ => {}
        }
        i += 1;
        if i >= max && !quoted {
            return Some(&part[start..]);
        }
    }

    None
}

/// Values leading with a digit try integer then float parsing; everything
/// else is stored as a cleaned string.
fn type_value(val: &[u8]) -> MetaValue {
    if val[0].is_ascii_digit() {
        if let Ok(n) = parse_int(val) {
            return MetaValue::Int(n);
        }
        if let Ok(f) = parse_float(val) {
            return MetaValue::Float(f);
        }
    }
    MetaValue::Str(clean_string(&String::from_utf8_lossy(val), true))
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod metadata_test;
