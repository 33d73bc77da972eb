//! RFC 5424 and RFC 3164 syslog parsing.
//!
//! Byte-oriented state machines with explicit cursors. RFC 5424 is attempted
//! first; a recoverable failure falls back to RFC 3164. The two share the
//! priority, date, hostname and column readers.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use siphon_protocol::{now_nanos, LogEvent, MetaValue, Severity};

use crate::error::ParseError;
use crate::metadata::parse_metadata;
use crate::strconv::parse_uint;
use crate::text::{clean_string, process_text};

/// RFC 5424 pre-defined SD-ID that carries no useful payload.
const SD_ID_TIME_QUALITY: &str = "timeQuality";

/// RFC 3164 tags longer than this are not tags.
const MAX_TAG_LEN: usize = 32;

/// ISO timestamp layouts; RFC 3339 is attempted first, the offset-less form
/// second (a trailing `Z` forces UTC and drops straight to the second form).
const ISO_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Which date layouts a grammar position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    /// RFC 3164: `Jan 02 15:04:05` style layouts, or ISO when the token
    /// carries a `Z`/`+`/`-`.
    Any,
    /// RFC 5424: ISO only.
    Iso,
}

/// Byte cursor over the trimmed packet. `l` is the number of unread bytes.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    data: &'a [u8],
    i: usize,
    l: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor {
            data,
            i: 0,
            l: data.len(),
        }
    }

    fn byte(&self) -> u8 {
        self.data[self.i]
    }

    fn bump(&mut self) {
        self.i += 1;
        self.l -= 1;
    }

    fn advance(&mut self, n: usize) {
        self.i += n;
        self.l -= n;
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.i..]
    }
}

/// Parse a syslog packet, trying RFC 5424 then RFC 3164.
pub(crate) fn parse_syslog(data: &[u8]) -> Result<LogEvent, ParseError> {
    let mut length = data.len();
    while length > 0 && (data[length - 1] == b'\n' || data[length - 1] == 0) {
        length -= 1;
    }
    if length < 3 {
        return Err(ParseError::Parse);
    }
    let data = &data[..length];

    let mut event = LogEvent::new();
    match parse_rfc5424(&mut event, data) {
        Ok(()) => Ok(event),
        Err(ParseError::Parse) => {
            parse_rfc3164(&mut event, data)?;
            Ok(event)
        }
        Err(err) => Err(err),
    }
}

/// Parse a line that must be a syslog packet (first byte `<`).
pub(crate) fn parse_syslog_line(data: &[u8]) -> Result<LogEvent, ParseError> {
    if data.first() != Some(&b'<') {
        return Err(ParseError::Parse);
    }
    parse_syslog(data)
}

fn parse_rfc5424(event: &mut LogEvent, data: &[u8]) -> Result<(), ParseError> {
    // SYSLOG-MSG: HEADER SP STRUCTURED-DATA [SP MSG]
    // HEADER: PRI VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP MSGID
    let mut c = Cursor::new(data);

    if !parse_priority(event, &mut c) || !parse_version(&mut c) {
        return Err(ParseError::Parse);
    }
    if !skip_space(&mut c) {
        return Err(ParseError::Parse);
    }
    if !parse_date(event, DateKind::Iso, &mut c) {
        return Err(ParseError::Parse);
    }

    parse_hostname(event, &mut c);
    if !skip_space(&mut c) {
        return Err(ParseError::Parse);
    }

    event.application = column_string(parse_column(&mut c));
    if !skip_space(&mut c) {
        return Err(ParseError::Parse);
    }

    // procid
    parse_column(&mut c);
    if !skip_space(&mut c) {
        return Err(ParseError::Parse);
    }

    // msgid
    parse_column(&mut c);
    if !skip_space(&mut c) {
        return Err(ParseError::Parse);
    }

    // Either the nil structured data marker or one or more SD elements.
    if c.l > 0 && c.byte() == b'-' {
        c.bump();
    } else {
        let elements = parse_structured_data(&mut c)?;
        for element in elements {
            if element.id == SD_ID_TIME_QUALITY {
                continue;
            }

            let prefix = if element.id.starts_with("axiom") {
                String::new()
            } else if let Some(at) = element.id.find('@').filter(|&at| at > 0) {
                format!("{}.", &element.id[..at])
            } else {
                format!("{}.", element.id)
            };

            for (param, value) in element.params {
                event
                    .metadata
                    .insert(format!("{prefix}{param}"), MetaValue::Str(value));
            }
        }
    }
    // optional space after SD
    skip_space(&mut c);

    event.application = strip_pid(&event.application);

    let text = process_text(c.rest()).ok_or(ParseError::Corrupted)?;
    event.text = clean_string(&text, false);

    parse_metadata(event, c.rest());

    Ok(())
}

fn parse_rfc3164(event: &mut LogEvent, data: &[u8]) -> Result<(), ParseError> {
    // PRI [SEQID ":"] [DATE SP] [HOSTNAME SP] [APP[pid]:] SP MSG
    let mut c = Cursor::new(data);

    if !parse_priority(event, &mut c) {
        return Err(ParseError::Parse);
    }

    parse_sequence_id(event, &mut c);
    skip_spaces(&mut c);

    if parse_date(event, DateKind::Any, &mut c) {
        skip_spaces(&mut c);
    } else {
        event.timestamp = now_nanos();
    }

    // Expected: `hostname program[pid]:` though both are optional
    parse_hostname(event, &mut c);
    skip_spaces(&mut c);
    parse_3164_application(event, &mut c);

    // Sometimes we'll catch in hostname instead of app
    if !event.hostname.is_empty() && event.application.is_empty() {
        event.application = std::mem::take(&mut event.hostname);
    }

    let text = process_text(c.rest()).ok_or(ParseError::Corrupted)?;
    event.text = clean_string(&text, false);

    parse_metadata(event, c.rest());

    Ok(())
}

/// `<` DIGITS `>`; severity is `pri mod 8`. A missing priority is accepted
/// (the cursor is left untouched), a malformed one is not.
fn parse_priority(event: &mut LogEvent, c: &mut Cursor) -> bool {
    if c.l > 0 && c.byte() == b'<' {
        c.bump();
        let mut pri: i64 = 0;
        let mut valid = false;
        while c.l > 0 && c.byte() != b'>' {
            let b = c.byte();
            if b.is_ascii_digit() {
                valid = true;
                pri = pri.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
            } else {
                return false;
            }
            c.bump();
        }
        if !valid || c.l == 0 {
            return false;
        }
        event.severity = Severity::from_pri(pri);
        c.bump();
    }
    true
}

/// VERSION: 1-999, terminated by a space.
fn parse_version(c: &mut Cursor) -> bool {
    let mut version: i64 = 0;
    while c.l > 0 && c.byte() != b' ' {
        let b = c.byte();
        if !b.is_ascii_digit() {
            return false;
        }
        version = version * 10 + i64::from(b - b'0');
        if version > 999 {
            return false;
        }
        c.bump();
    }
    version >= 1
}

/// Consume a single space.
fn skip_space(c: &mut Cursor) -> bool {
    if c.l > 0 && c.byte() == b' ' {
        c.bump();
        return true;
    }
    false
}

/// Consume any run of spaces.
fn skip_spaces(c: &mut Cursor) {
    while c.l > 0 && c.byte() == b' ' {
        c.bump();
    }
}

/// Space-delimited column. Returns `None` for the nil value `-` and for a
/// column that runs to the end of the data.
fn parse_column<'a>(c: &mut Cursor<'a>) -> Option<&'a [u8]> {
    let start = c.i;

    let mut space = 0;
    for j in 0..c.l {
        if c.data[c.i + j] == b' ' {
            space = j;
            break;
        }
    }

    if space > 0 {
        c.advance(space);
    } else {
        c.advance(c.l);
    }

    let mut result = None;
    if c.l > 0 && c.i > start {
        result = Some(&c.data[start..c.i]);
    }

    match result {
        Some(b"-") => None,
        other => other,
    }
}

fn column_string(column: Option<&[u8]>) -> String {
    column
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .unwrap_or_default()
}

/// APP-NAME may carry a `[pid]` suffix; everything from the first `[` on is
/// dropped.
fn strip_pid(app: &str) -> String {
    match app.find('[') {
        Some(idx) => app[..idx].to_string(),
        None => app.to_string(),
    }
}

/// Next space-delimited token as the hostname, unless it ends in `:` or `]`,
/// in which case it is actually an application tag and the cursor is
/// restored.
fn parse_hostname(event: &mut LogEvent, c: &mut Cursor) {
    let saved = *c;

    while c.l > 0 && c.byte() != b' ' {
        c.bump();
    }

    if c.i > 0 && (c.data[c.i - 1] == b':' || c.data[c.i - 1] == b']') {
        *c = saved;
        return;
    }

    event.hostname = String::from_utf8_lossy(&c.data[saved.i..c.i]).into_owned();
}

/// RFC 3164 tag: `APP[pid]:` followed by a space. Restores the cursor when
/// the token cannot be a tag (too long, or no trailing space).
fn parse_3164_application(event: &mut LogEvent, c: &mut Cursor) -> bool {
    let saved = *c;

    while c.l > 0 && !matches!(c.byte(), b' ' | b'[' | b':') {
        c.bump();
    }

    if c.i - saved.i > MAX_TAG_LEN {
        *c = saved;
        return false;
    }

    let app = &c.data[saved.i..c.i];

    // Check for PID
    if c.l > 0 && c.byte() == b'[' {
        while c.l > 0 && !matches!(c.byte(), b' ' | b']' | b':') {
            c.bump();
        }
        if c.l > 0 && c.byte() == b']' {
            c.bump();
        }
    }

    if c.l > 0 && c.byte() == b':' {
        c.bump();
    }

    let space_idx = c.i;
    if c.l > 0 && c.byte() == b' ' {
        c.bump();
    }

    if c.i == space_idx {
        // no space after the tag, so most likely not a tag
        *c = saved;
        return false;
    }

    event.application = String::from_utf8_lossy(app).into_owned();
    true
}

/// Optional leading `DIGITS ":"` followed by a space, stored as metadata key
/// `SequenceID`. The cursor is left on the space.
fn parse_sequence_id(event: &mut LogEvent, c: &mut Cursor) -> bool {
    let saved = *c;

    while c.l > 0 && c.byte() != b':' {
        if !c.byte().is_ascii_digit() {
            *c = saved;
            return false;
        }
        c.bump();
    }

    if c.i == saved.i || c.l == 0 {
        *c = saved;
        return false;
    }
    let digits_end = c.i;
    c.bump();

    if c.l == 0 || c.byte() != b' ' {
        *c = saved;
        return false;
    }

    event.metadata.insert(
        "SequenceID".to_string(),
        MetaValue::Str(String::from_utf8_lossy(&c.data[saved.i..digits_end]).into_owned()),
    );
    true
}

/// Parse a timestamp at the cursor. On success the cursor is advanced past
/// the timestamp and one separator byte; on failure it is restored.
fn parse_date(event: &mut LogEvent, kind: DateKind, c: &mut Cursor) -> bool {
    let saved = *c;

    // ISO detection: a `Z`, `+` or `-` inside the first space-delimited
    // token. This also catches the leading date of `2006-01-02T...`.
    let mut token_end = c.i + c.l;
    for j in c.i..c.i + c.l {
        if c.data[j] == b' ' {
            token_end = j;
            break;
        }
    }
    let iso = c.data[c.i..token_end]
        .iter()
        .any(|&b| matches!(b, b'Z' | b'+' | b'-'));

    let parsed = if iso {
        parse_iso_date(&c.data[c.i..token_end]).map(|ts| (ts, token_end - c.i))
    } else if kind == DateKind::Iso {
        None
    } else {
        parse_std_date(c.rest())
    };

    match parsed {
        Some((timestamp, consumed)) => {
            event.timestamp = timestamp;
            c.advance(consumed);
            if c.l > 0 {
                c.bump();
            }
            true
        }
        None => {
            *c = saved;
            false
        }
    }
}

/// ISO timestamp token. A trailing `Z` forces UTC; an explicit offset goes
/// through RFC 3339; anything else is interpreted in local time. Year 0
/// means "no year given" and is replaced with the current year.
fn parse_iso_date(token: &[u8]) -> Option<i64> {
    let s = std::str::from_utf8(token).ok()?;

    if let Some(stripped) = s.strip_suffix('Z') {
        for format in ISO_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, format) {
                let ts = fix_year_utc(Utc.from_utc_datetime(&naive));
                return Some(ts.timestamp_nanos_opt().unwrap_or(0));
            }
        }
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        let ts = if ts.year() == 0 {
            ts.with_year(Local::now().year()).unwrap_or(ts)
        } else {
            ts
        };
        return Some(ts.timestamp_nanos_opt().unwrap_or(0));
    }

    for format in ISO_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            let naive = fix_year_naive(naive);
            return Some(local_nanos(naive));
        }
    }

    None
}

fn fix_year_utc(ts: DateTime<Utc>) -> DateTime<Utc> {
    if ts.year() == 0 {
        ts.with_year(Local::now().year()).unwrap_or(ts)
    } else {
        ts
    }
}

fn fix_year_naive(naive: NaiveDateTime) -> NaiveDateTime {
    if naive.year() == 0 {
        naive.with_year(Local::now().year()).unwrap_or(naive)
    } else {
        naive
    }
}

/// Interpret a naive timestamp as local time. DST-ambiguous times resolve to
/// the earlier occurrence; times inside a DST gap fall back to UTC.
fn local_nanos(naive: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.timestamp_nanos_opt().unwrap_or(0))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive).timestamp_nanos_opt().unwrap_or(0))
}

/// `Jan 02 15:04:05`-style date, optionally with a four-digit year before
/// the time and a fractional-second suffix. Missing year means the current
/// year; the result is local time. Returns nanoseconds and consumed bytes.
fn parse_std_date(data: &[u8]) -> Option<(i64, usize)> {
    let len = data.len();
    if len < 3 {
        return None;
    }

    let month = month_from_abbr(&data[..3])?;
    let mut i = 3;

    if i >= len || data[i] != b' ' {
        return None;
    }
    while i < len && data[i] == b' ' {
        i += 1;
    }

    let day_start = i;
    while i < len && data[i].is_ascii_digit() {
        i += 1;
    }
    let day_len = i - day_start;
    if day_len == 0 || day_len > 2 {
        return None;
    }
    let day = parse_uint(&data[day_start..i]).ok()?;

    if i >= len || data[i] != b' ' {
        return None;
    }
    i += 1;

    // An optional four-digit year between day and time.
    let mut year = None;
    if i + 4 < len
        && data[i..i + 4].iter().all(u8::is_ascii_digit)
        && data[i + 4] == b' '
    {
        year = Some(parse_uint(&data[i..i + 4]).ok()? as i32);
        i += 5;
    }

    let (hour, min, sec, time_len) = parse_clock(&data[i..])?;
    i += time_len;

    // Fractional seconds: a dot followed by at least one digit.
    let mut nanos: u32 = 0;
    if i + 1 < len && data[i] == b'.' && data[i + 1].is_ascii_digit() {
        i += 1;
        let mut scale = 100_000_000u32;
        while i < len && data[i].is_ascii_digit() {
            if scale > 0 {
                nanos += u32::from(data[i] - b'0') * scale;
                scale /= 10;
            }
            i += 1;
        }
    }

    let year = year.unwrap_or_else(|| Local::now().year());
    let naive = NaiveDate::from_ymd_opt(year, month, day as u32)?
        .and_hms_nano_opt(hour, min, sec, nanos)?;

    Some((local_nanos(naive), i))
}

/// `HH:MM:SS` with a one- or two-digit hour.
fn parse_clock(data: &[u8]) -> Option<(u32, u32, u32, usize)> {
    let len = data.len();
    let mut i = 0;

    let hour_start = i;
    while i < len && data[i].is_ascii_digit() && i - hour_start < 2 {
        i += 1;
    }
    if i == hour_start || i >= len || data[i] != b':' {
        return None;
    }
    let hour = parse_uint(&data[hour_start..i]).ok()? as u32;
    i += 1;

    if i + 2 > len || !data[i].is_ascii_digit() || !data[i + 1].is_ascii_digit() {
        return None;
    }
    let min = parse_uint(&data[i..i + 2]).ok()? as u32;
    i += 2;

    if i >= len || data[i] != b':' {
        return None;
    }
    i += 1;

    if i + 2 > len || !data[i].is_ascii_digit() || !data[i + 1].is_ascii_digit() {
        return None;
    }
    let sec = parse_uint(&data[i..i + 2]).ok()? as u32;
    i += 2;

    Some((hour, min, sec, i))
}

fn month_from_abbr(abbr: &[u8]) -> Option<u32> {
    let lowered = [
        abbr[0].to_ascii_lowercase(),
        abbr[1].to_ascii_lowercase(),
        abbr[2].to_ascii_lowercase(),
    ];
    match &lowered {
        b"jan" => Some(1),
        b"feb" => Some(2),
        b"mar" => Some(3),
        b"apr" => Some(4),
        b"may" => Some(5),
        b"jun" => Some(6),
        b"jul" => Some(7),
        b"aug" => Some(8),
        b"sep" => Some(9),
        b"oct" => Some(10),
        b"nov" => Some(11),
        b"dec" => Some(12),
        _ => None,
    }
}

/// One `[SD-ID PARAM="VALUE" ...]` element.
struct SdElement {
    id: String,
    params: Vec<(String, String)>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'@' || b == b'.'
}

/// Tokenize one or more adjacent SD elements. On success the cursor is moved
/// to the first byte after the final `]`.
fn parse_structured_data<'a>(c: &mut Cursor<'a>) -> Result<Vec<SdElement>, ParseError> {
    if c.l == 0 || c.byte() != b'[' {
        return Err(ParseError::Parse);
    }

    let data = c.data;
    let len = data.len();
    let mut pos = c.i + 1;

    let mut elements: Vec<SdElement> = Vec::new();
    let mut current: Option<usize> = None;
    let mut param: Option<String> = None;
    let mut expecting_val = false;
    let mut in_elem = true;
    let mut end_idx: Option<usize> = None;

    while pos < len {
        let b = data[pos];
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
            }
            b'"' => {
                if !expecting_val {
                    break;
                }
                let (value_start, value_end) = match scan_quoted(data, pos) {
                    Some(span) => span,
                    None => break,
                };
                let (Some(idx), Some(name)) = (current, param.take()) else {
                    break;
                };
                let mut raw = &data[value_start..value_end];
                // trim the values if they contain null bytes
                if let Some(nul) = raw.iter().position(|&v| v == 0) {
                    raw = &raw[..nul];
                }
                let value = clean_string(&String::from_utf8_lossy(raw), false);
                elements[idx].params.push((name, value));
                expecting_val = false;
                pos = value_end + 1;
            }
            b'[' => {
                if in_elem {
                    break;
                }
                in_elem = true;
                pos += 1;
            }
            b']' => {
                if !in_elem {
                    break;
                }
                in_elem = false;
                current = None;
                pos += 1;
                if pos >= len {
                    end_idx = Some(pos);
                    break;
                }
                if data[pos] != b'[' {
                    end_idx = Some(pos);
                    break;
                }
            }
            b'=' => {
                if param.is_none() {
                    break;
                }
                expecting_val = true;
                pos += 1;
            }
            _ if is_ident_byte(b) => {
                let start = pos;
                while pos < len && is_ident_byte(data[pos]) {
                    pos += 1;
                }
                let ident = String::from_utf8_lossy(&data[start..pos]).into_owned();
                if current.is_none() {
                    elements.push(SdElement {
                        id: ident,
                        params: Vec::new(),
                    });
                    current = Some(elements.len() - 1);
                } else if param.is_none() {
                    param = Some(ident);
                } else {
                    break;
                }
            }
            _ => {
                // Unrecognized bytes between tokens are skipped.
                pos += 1;
            }
        }
    }

    match end_idx {
        Some(idx) => {
            c.i = idx;
            c.l = len - idx;
            Ok(elements)
        }
        None => Err(ParseError::Parse),
    }
}

/// Span of a quoted string's content (quotes excluded), honoring backslash
/// escapes. `None` when the string is unterminated.
fn scan_quoted(data: &[u8], open: usize) -> Option<(usize, usize)> {
    let mut pos = open + 1;
    while pos < data.len() {
        match data[pos] {
            b'\\' => pos += 2,
            b'"' => return Some((open + 1, pos)),
            _ => pos += 1,
        }
    }
    None
}
