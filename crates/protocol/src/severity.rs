//! Syslog severity levels (RFC 5424 §6.2.1) plus `Trace` and `Unknown`.

use serde::Serialize;

/// Severity of a log event.
///
/// Ordered by wire value: `Emergency` (0) is the most severe, `Trace` (8) the
/// least. `Unknown` (-1) is a sentinel used while parsing; normalization maps
/// it to `Info`, so it never appears on an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    Trace,
}

impl Severity {
    /// Severity encoded in a syslog priority value (`pri mod 8`).
    pub fn from_pri(pri: i64) -> Severity {
        Severity::from_value(pri.rem_euclid(8))
    }

    /// Severity from its numeric wire value. Out-of-range values map to
    /// `Unknown`.
    pub fn from_value(v: i64) -> Severity {
        match v {
            0 => Severity::Emergency,
            1 => Severity::Alert,
            2 => Severity::Critical,
            3 => Severity::Error,
            4 => Severity::Warning,
            5 => Severity::Notice,
            6 => Severity::Info,
            7 => Severity::Debug,
            8 => Severity::Trace,
            _ => Severity::Unknown,
        }
    }

    /// Severity from a case-insensitive name. Accepts the short aliases
    /// `warn`, `err` and `crit`.
    pub fn from_name(s: &str) -> Severity {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Severity::Trace,
            "debug" => Severity::Debug,
            "info" => Severity::Info,
            "notice" => Severity::Notice,
            "warning" | "warn" => Severity::Warning,
            "error" | "err" => Severity::Error,
            "critical" | "crit" => Severity::Critical,
            "alert" => Severity::Alert,
            "emergency" => Severity::Emergency,
            _ => Severity::Unknown,
        }
    }

    /// Numeric wire value (`Unknown` is -1).
    pub fn value(self) -> i64 {
        match self {
            Severity::Unknown => -1,
            Severity::Emergency => 0,
            Severity::Alert => 1,
            Severity::Critical => 2,
            Severity::Error => 3,
            Severity::Warning => 4,
            Severity::Notice => 5,
            Severity::Info => 6,
            Severity::Debug => 7,
            Severity::Trace => 8,
        }
    }

    /// Lowercase name, as used in outbound records.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Emergency => "emergency",
            Severity::Alert => "alert",
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pri() {
        assert_eq!(Severity::from_pri(14), Severity::Info);
        assert_eq!(Severity::from_pri(15), Severity::Debug);
        assert_eq!(Severity::from_pri(165), Severity::Notice);
        assert_eq!(Severity::from_pri(0), Severity::Emergency);
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(Severity::from_name("WARN"), Severity::Warning);
        assert_eq!(Severity::from_name("warning"), Severity::Warning);
        assert_eq!(Severity::from_name("err"), Severity::Error);
        assert_eq!(Severity::from_name("crit"), Severity::Critical);
        assert_eq!(Severity::from_name("bogus"), Severity::Unknown);
    }

    #[test]
    fn test_ordering_matches_wire_values() {
        assert!(Severity::Unknown < Severity::Emergency);
        assert!(Severity::Critical < Severity::Error);
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Debug < Severity::Trace);
    }

    #[test]
    fn test_value_round_trip() {
        for v in -1..=8 {
            assert_eq!(Severity::from_value(v).value(), v);
        }
    }

    #[test]
    fn test_as_str_lowercase() {
        assert_eq!(Severity::Error.as_str(), "error");
        assert_eq!(Severity::Trace.as_str(), "trace");
        assert_eq!(Severity::Emergency.to_string(), "emergency");
    }
}
