use std::io;

use resp_proto::ParseError;
use thiserror::Error;

/// Rejected command input. Local to the failed submit; the connection is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The argument vector was empty.
    #[error("empty command")]
    EmptyCommand,
    /// The number of declared lengths differs from the number of arguments.
    #[error("{lengths} declared lengths for {args} arguments")]
    LengthCountMismatch { args: usize, lengths: usize },
    /// An argument's declared length differs from its content.
    #[error("argument {index}: declared length {declared}, actual {actual}")]
    LengthMismatch {
        index: usize,
        declared: usize,
        actual: usize,
    },
}

/// Errors returned by, or recorded on, a connection context.
#[derive(Debug, Error)]
pub enum Error {
    /// The context already carries an event subscription.
    #[error("event subscription already attached")]
    AlreadyAttached,

    /// A submitted command could not be framed.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The input stream could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// A reply arrived while no command was pending.
    #[error("reply received with no pending command")]
    QueueUnderflow,

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Socket or reactor registration failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The connection was closed locally.
    #[error("disconnected")]
    Disconnected,

    /// The context is draining or closed and accepts no further operations.
    #[error("not connected")]
    NotConnected,
}

impl Error {
    /// Returns true if this error tears the connection down.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::AlreadyAttached | Error::Encoding(_) | Error::NotConnected
        )
    }

    /// Returns true for decode failures and reply/command count mismatches.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::QueueUnderflow)
    }

    /// Returns true for transport-level failures and closed connections.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed | Error::Io(_) | Error::Disconnected | Error::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(!Error::AlreadyAttached.is_fatal());
        assert!(!Error::Encoding(EncodingError::EmptyCommand).is_fatal());
        assert!(!Error::NotConnected.is_fatal());
        assert!(Error::NotConnected.is_connection());

        assert!(Error::QueueUnderflow.is_fatal());
        assert!(Error::QueueUnderflow.is_protocol());
        assert!(!Error::QueueUnderflow.is_connection());

        let protocol = Error::from(ParseError::InvalidPrefix(b'?'));
        assert!(protocol.is_fatal() && protocol.is_protocol());

        let io = Error::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(io.is_fatal() && io.is_connection() && !io.is_protocol());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::from(EncodingError::LengthMismatch {
                index: 1,
                declared: 3,
                actual: 2
            })
            .to_string(),
            "encoding error: argument 1: declared length 3, actual 2"
        );
        assert_eq!(
            Error::QueueUnderflow.to_string(),
            "reply received with no pending command"
        );
    }
}
