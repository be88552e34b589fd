//! Reply decoding failures.

use thiserror::Error;

/// Why a buffer could not be decoded into a [`Value`](crate::Value).
///
/// [`Incomplete`](ParseError::Incomplete) only means the buffer ends inside a
/// reply. Every other variant means the stream is malformed and cannot be
/// resynchronized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer ends before the reply does.
    #[error("incomplete data")]
    Incomplete,

    /// The first byte of a reply is not a known type marker.
    #[error("invalid prefix byte: {0:#04x}")]
    InvalidPrefix(u8),

    /// An integer or length field is not a decimal `i64`.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// A negative length other than the `-1` null marker.
    #[error("invalid length: {0}")]
    InvalidLength(i64),

    /// Any other framing violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An array declares more elements than allowed.
    #[error("collection too large: {0} elements exceeds limit")]
    CollectionTooLarge(usize),

    /// Arrays nest deeper than allowed.
    #[error("nesting too deep: depth {0} exceeds limit")]
    NestingTooDeep(usize),

    /// A bulk string declares more bytes than allowed.
    #[error("bulk string too long: {len} bytes exceeds {max} byte limit")]
    BulkStringTooLong { len: usize, max: usize },

    /// No CRLF within the allowed line length.
    #[error("line too long: exceeds {max} byte limit")]
    LineTooLong { max: usize },
}

impl ParseError {
    /// Returns true when more bytes may complete the reply.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }

    /// Returns true when a configured parse limit was exceeded.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            ParseError::CollectionTooLarge(_)
                | ParseError::NestingTooDeep(_)
                | ParseError::BulkStringTooLong { .. }
                | ParseError::LineTooLong { .. }
        )
    }
}
