//! Internal parser failure sentinels.

/// Why a parse attempt failed.
///
/// These never cross the listener boundary: `Parse` makes the caller try the
/// next strategy (JSON -> syslog, RFC 5424 -> RFC 3164, failure -> synthesized
/// record), `Corrupted` drops the input outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Recoverable: the input does not match the attempted format.
    #[error("parsing error")]
    Parse,

    /// Unrecoverable: the first byte of the sanitized text is NUL.
    #[error("corrupted data")]
    Corrupted,
}
