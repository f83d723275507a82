//! Error types for the calendar matching protocol.

use thiserror::Error;

/// Errors that can occur while running a matching session.
#[derive(Debug, Error)]
pub enum CalMatchError {
    /// A peer's public key did not decode to a valid curve point.
    #[error("invalid peer public key: {0}")]
    InvalidPeerKey(String),

    /// A blinded value did not decode to a valid curve point.
    #[error("invalid blinded point: {0}")]
    InvalidPoint(String),

    /// AEAD tag verification failed (tampering, wrong key, or corruption).
    #[error("note authentication failed")]
    AuthenticationFailed,

    /// A note envelope was not `nonce-hex:cipher-hex`.
    #[error("malformed note envelope: {0}")]
    MalformedEnvelope(String),

    /// No relay room exists for the given session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The relay rejected or failed a send/poll.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A note was composed before the shared secret existed.
    #[error("secure channel not established")]
    NoSecureChannel,

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("message serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, CalMatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", CalMatchError::AuthenticationFailed),
            "note authentication failed"
        );
        assert_eq!(
            format!("{}", CalMatchError::SessionNotFound("ROOM1".to_string())),
            "session not found: ROOM1"
        );
        assert_eq!(
            format!("{}", CalMatchError::InvalidPoint("bad encoding".to_string())),
            "invalid blinded point: bad encoding"
        );
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: CalMatchError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, CalMatchError::HexDecode(_)));
    }
}
