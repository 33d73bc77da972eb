//! Tests for byte-slice numeric parsing

use super::{parse_float, parse_int, parse_uint};

#[test]
fn test_parse_uint() {
    assert_eq!(parse_uint(b"0").unwrap(), 0);
    assert_eq!(parse_uint(b"42").unwrap(), 42);
    assert_eq!(parse_uint(b"18446744073709551615").unwrap(), u64::MAX);

    assert!(parse_uint(b"").is_err());
    assert!(parse_uint(b"-1").is_err());
    assert!(parse_uint(b"1x").is_err());
    assert!(parse_uint(b"18446744073709551616").is_err());
}

#[test]
fn test_parse_int() {
    assert_eq!(parse_int(b"0").unwrap(), 0);
    assert_eq!(parse_int(b"1234").unwrap(), 1234);
    assert_eq!(parse_int(b"+7").unwrap(), 7);
    assert_eq!(parse_int(b"-7").unwrap(), -7);

    assert!(parse_int(b"").is_err());
    assert!(parse_int(b"-").is_err());
    assert!(parse_int(b"+").is_err());
    assert!(parse_int(b"5.6").is_err());
    assert!(parse_int(b"2018-06-02").is_err());
}

#[test]
fn test_parse_float() {
    assert_eq!(parse_float(b"0").unwrap(), 0.0);
    assert_eq!(parse_float(b"3").unwrap(), 3.0);
    assert_eq!(parse_float(b"5.6").unwrap(), 5.6);
    assert_eq!(parse_float(b"4.3").unwrap(), 4.3);
    assert_eq!(parse_float(b"-2.25").unwrap(), -2.25);
    assert_eq!(parse_float(b"10.").unwrap(), 10.0);

    assert!(parse_float(b"").is_err());
    assert!(parse_float(b"1.2.3").is_err());
    assert!(parse_float(b"1e5").is_err());
    assert!(parse_float(b"nan").is_err());
}
