//! Byte-slice numeric parsing.
//!
//! Equivalents of the std string parsers that operate directly on `&[u8]`,
//! skipping UTF-8 validation and the string allocation in the metadata hot
//! path. Exponent notation is not supported.

/// A byte slice that does not form a valid number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid numeric literal")]
pub struct NumError;

/// Parse an unsigned decimal integer.
pub(crate) fn parse_uint(s: &[u8]) -> Result<u64, NumError> {
    if s.is_empty() {
        return Err(NumError);
    }
    let mut result: u64 = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return Err(NumError);
        }
        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_add(u64::from(b - b'0')))
            .ok_or(NumError)?;
    }
    Ok(result)
}

/// Parse a signed decimal integer. A `+` or `-` is only accepted at offset 0
/// and must be followed by at least one digit.
pub(crate) fn parse_int(s: &[u8]) -> Result<i64, NumError> {
    let (negative, digits) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(NumError),
    };
    if digits.is_empty() {
        return Err(NumError);
    }
    let mut result: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(NumError);
        }
        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_add(i64::from(b - b'0')))
            .ok_or(NumError)?;
    }
    Ok(if negative { -result } else { result })
}

/// Parse a decimal floating point number with an optional single `.`.
/// No exponents.
pub(crate) fn parse_float(s: &[u8]) -> Result<f64, NumError> {
    let (negative, digits) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(NumError),
    };
    if digits.is_empty() {
        return Err(NumError);
    }

    let mut mantissa: f64 = 0.0;
    let mut decimals: Option<i32> = None;
    for &b in digits {
        match b {
            b'.' => {
                if decimals.is_some() {
                    return Err(NumError);
                }
                decimals = Some(0);
            }
            b'0'..=b'9' => {
                mantissa = mantissa * 10.0 + f64::from(b - b'0');
                if let Some(d) = decimals.as_mut() {
                    *d += 1;
                }
            }
            _ => return Err(NumError),
        }
    }

    let mut result = mantissa / 10f64.powi(decimals.unwrap_or(0));
    if negative {
        result = -result;
    }
    Ok(result)
}

#[cfg(test)]
#[path = "strconv_test.rs"]
mod strconv_test;
