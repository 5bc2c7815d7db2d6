//! Error types for the CCX codec and its UDP tooling.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for codec and transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Error, Debug)]
pub enum Error {
    // Codec errors
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // Transport errors
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Encoding and decoding errors for CCX packets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid mac-address '{0}': expected 6 colon-delimited hex octets")]
    InvalidMacAddress(String),

    #[error("truncated or malformed {what}: need {needed} bytes, {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unknown group id: {0}")]
    UnknownGroup(u8),

    #[error("unknown telemetry type: {0}")]
    UnknownTelemetryType(u8),

    #[error("group length mismatch for {what}: expected {expected}, got {got}")]
    GroupLengthMismatch {
        what: &'static str,
        expected: usize,
        got: u8,
    },

    #[error("status payload has odd length {0}")]
    OddStatusLength(usize),

    #[error("status string too long: {len} characters (max {max})")]
    StatusTooLong { len: usize, max: usize },

    #[error("status string is not ASCII: {0:?}")]
    NonAsciiStatus(String),
}

impl ProtocolError {
    pub(crate) fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }
}

/// Transport layer errors.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("bind failed on {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },

    #[error("connect failed to {addr}: {reason}")]
    ConnectFailed { addr: SocketAddr, reason: String },

    #[error("could not resolve '{0}'")]
    Resolve(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("socket error: {0}")]
    SocketError(String),

    #[error("short write: sent {sent} of {len} bytes")]
    ShortWrite { sent: usize, len: usize },
}

impl Error {
    /// Check if the error came from running out of bytes while decoding.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Protocol(ProtocolError::Truncated { .. }))
    }

    /// Check if the error means the received bytes are not a valid CCX packet.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Protocol(
                ProtocolError::Truncated { .. }
                    | ProtocolError::UnknownGroup(_)
                    | ProtocolError::UnknownTelemetryType(_)
                    | ProtocolError::GroupLengthMismatch { .. }
                    | ProtocolError::OddStatusLength(_)
                    | ProtocolError::NonAsciiStatus(_)
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err: Error = ProtocolError::truncated("fixed region", 34, 10).into();
        assert!(err.is_truncation());
        assert!(err.is_malformed());

        let err: Error = ProtocolError::InvalidMacAddress("zz".into()).into();
        assert!(!err.is_truncation());
        assert!(!err.is_malformed());

        let err: Error = ProtocolError::OddStatusLength(3).into();
        assert!(err.is_malformed());

        let err: Error = ProtocolError::NonAsciiStatus("\u{e9}".into()).into();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_error_messages() {
        let err = ProtocolError::truncated("status string", 28, 4);
        assert_eq!(
            err.to_string(),
            "truncated or malformed status string: need 28 bytes, 4 available"
        );

        let err: Error = TransportError::ShortWrite { sent: 3, len: 40 }.into();
        assert_eq!(err.to_string(), "transport error: short write: sent 3 of 40 bytes");
    }
}
