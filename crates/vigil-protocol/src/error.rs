//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding Vigil payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or a field
    /// of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but violates a protocol rule (empty token,
    /// non-UTF-8 text record, ...).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
