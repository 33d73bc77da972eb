//! The parser facade: format detection, fallback chain, post-fill and
//! severity normalization.

use chrono::{SecondsFormat, Utc};

use siphon_protocol::{now_nanos, LogEvent, Severity};

use crate::error::ParseError;
use crate::json::parse_json;
use crate::syslog::parse_syslog_line;
use crate::LOGFILE_KEY;

/// Parse one framed line into an emitted event.
///
/// Returns `None` for empty input, corrupted input, or events whose
/// post-normalized text is empty.
pub fn parse(line: &[u8], remote_addr: &str) -> Option<LogEvent> {
    let event = parse_line_with_fallback(line, remote_addr)?;
    if event.text.is_empty() {
        return None;
    }
    Some(event)
}

/// Parse one line, synthesizing a record when no format matches.
///
/// Unlike [`parse`] this keeps events with empty text, which is useful when
/// inspecting what the parser extracted.
pub fn parse_line_with_fallback(line: &[u8], remote_addr: &str) -> Option<LogEvent> {
    let attempt = match detect_maybe_json(line) {
        Some(json) => parse_json(json).or_else(|err| {
            // Not actually JSON after all; try it as syslog.
            tracing::debug!(error = %err, "JSON-looking line failed to parse, trying syslog");
            parse_syslog_line(line)
        }),
        None => parse_syslog_line(line),
    };

    let mut event = match attempt {
        Ok(event) => event,
        Err(ParseError::Corrupted) => return None,
        Err(ParseError::Parse) => {
            if line.is_empty() {
                return None;
            }
            tracing::debug!(len = line.len(), "unparseable line, synthesizing record");
            synthetic_event(remote_addr, line).ok()?
        }
    };

    event.remote_addr = remote_addr.to_string();
    if event.hostname.is_empty() {
        event.hostname = remote_addr.to_string();
    }
    if event.timestamp == 0 {
        event.timestamp = now_nanos();
    }

    parse_app(&mut event);

    // The text itself may be a JSON record; merge it over the event.
    let embedded = detect_maybe_json(event.text.as_bytes())
        .and_then(|json| parse_json(json).ok());
    if let Some(embedded) = embedded {
        event.merge(embedded);
    }

    // Always last
    populate_severity(&mut event);

    Some(event)
}

/// Find hints of a JSON object in the line. Does not guarantee the slice is
/// parseable JSON.
///
/// The line may lead with a syslog priority (`<N>`); skipping it avoids the
/// RFC 5424 parser eating JSON fields as hostname/app-name.
fn detect_maybe_json(line: &[u8]) -> Option<&[u8]> {
    if line.is_empty() {
        return None;
    }

    // JSON objects always end with '}'; search backwards past trailing
    // spaces.
    let mut far_index = None;
    for (idx, &b) in line.iter().enumerate().rev() {
        match b {
            b' ' => continue,
            b'}' => far_index = Some(idx),
            _ => return None,
        }
        break;
    }
    let far_index = far_index.filter(|&idx| idx >= 1)?;

    let mut i = 0;
    while i < line.len() {
        match line[i] {
            b' ' => {}
            b'<' => {
                while i < line.len() && line[i] != b'>' {
                    i += 1;
                }
            }
            b'{' => return Some(&line[i..=far_index]),
            _ => return None,
        }
        i += 1;
    }

    None
}

/// Wrap unparseable input in a manufactured RFC 3164 record.
fn synthetic_event(host: &str, msg: &[u8]) -> Result<LogEvent, ParseError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let trimmed = String::from_utf8_lossy(msg.trim_ascii());
    let line = format!("<14>{now} {host} unknown: {trimmed}");
    parse_syslog_line(line.as_bytes())
}

/// Post-process well-known applications: system facilities shipped from a
/// logfile carry the real record in their text, minus the syslog header.
fn parse_app(event: &mut LogEvent) {
    match event.application.as_str() {
        "auth" | "daemon" | "kern" | "syslog" => {
            if event.metadata.contains_key(LOGFILE_KEY) {
                reparse_headerless(event);
            }
        }
        _ => {}
    }
}

/// systemd and auth lines don't come in with the header so we need to add it
/// to parse them.
fn reparse_headerless(event: &mut LogEvent) {
    let line = format!("<6> {}", event.text);
    if let Ok(inner) = parse_syslog_line(line.as_bytes()) {
        event.application = inner.application;
        event.text = inner.text;
        event.metadata.extend(inner.metadata);
    }
}

/// Normalize severity for emission. After this the only severities an event
/// can carry are Error, Warning, Info, Debug or Trace.
fn populate_severity(event: &mut LogEvent) {
    if event.severity == Severity::Unknown {
        event.severity = Severity::Info;
    }

    if event.severity == Severity::Notice {
        event.severity = Severity::Info;
    }

    if event.severity < Severity::Error {
        event.severity = Severity::Error;
    }

    // Override with what's in the text
    if let Some(severity) = extract_severity(&event.text) {
        event.severity = severity;
    }
}

/// Scan text for the first severity word. ASCII-only case folding:
/// lowercase-led patterns match any case on their tail, uppercase-led
/// patterns match uppercase only (`ERR` being the short uppercase form).
fn extract_severity(text: &str) -> Option<Severity> {
    let bytes = text.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        let hit = match b {
            b'c' if fold_match(bytes, i + 1, b"rit") => Some(Severity::Critical),
            b'C' if exact_match(bytes, i + 1, b"RIT") => Some(Severity::Critical),
            b'e' if fold_match(bytes, i + 1, b"rror") => Some(Severity::Error),
            b'E' if exact_match(bytes, i + 1, b"RR") => Some(Severity::Error),
            b'w' if fold_match(bytes, i + 1, b"arn") => Some(Severity::Warning),
            b'W' if exact_match(bytes, i + 1, b"ARN") => Some(Severity::Warning),
            b'i' if fold_match(bytes, i + 1, b"nfo") => Some(Severity::Info),
            b'I' if exact_match(bytes, i + 1, b"NFO") => Some(Severity::Info),
            b'd' if fold_match(bytes, i + 1, b"ebug") => Some(Severity::Debug),
            b'D' if exact_match(bytes, i + 1, b"EBUG") => Some(Severity::Debug),
            b't' if fold_match(bytes, i + 1, b"race") => Some(Severity::Trace),
            b'T' if exact_match(bytes, i + 1, b"RACE") => Some(Severity::Trace),
            _ => None,
        };
        if hit.is_some() {
            return hit;
        }
    }

    None
}

/// Case-insensitive match of a lowercase pattern at `start`.
fn fold_match(text: &[u8], start: usize, pattern: &[u8]) -> bool {
    if start + pattern.len() > text.len() {
        return false;
    }
    pattern
        .iter()
        .zip(&text[start..])
        .all(|(&p, &b)| b == p || b == p.to_ascii_uppercase())
}

/// Exact match at `start`.
fn exact_match(text: &[u8], start: usize, pattern: &[u8]) -> bool {
    text.len() >= start + pattern.len() && &text[start..start + pattern.len()] == pattern
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;
