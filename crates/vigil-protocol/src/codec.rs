//! Codec trait and implementations for serializing/deserializing payloads.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The session core doesn't care HOW the persisted identity is written: it
//! just needs something that implements [`Codec`]. Swapping the format
//! means swapping the codec, not touching the session manager.
//!
//! The stores underneath are string key-value maps, so besides the
//! byte-level `encode`/`decode` the trait offers `encode_text`/`decode_text`
//! helpers that go through UTF-8.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the codec lives inside the `SessionManager`, which is
///   shared by `Arc` between the navigation guard, the API client and the
///   UI, possibly on different Tokio worker threads.
/// - `'static` → the codec owns everything it needs and borrows nothing
///   temporary, so it can sit in that long-lived shared state.
///
/// ## Generic methods
///
/// `encode` and `decode` are *generic*: they work with any `T` that
/// implements the matching serde trait.
/// - `encode<T: Serialize>` → `T` can be turned into bytes
/// - `decode<T: DeserializeOwned>` → `T` can be built from bytes
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result owns its
/// data instead of borrowing from the input. The record read from storage
/// is a temporary `String`, so a borrowing result could not outlive it.
///
/// Generic methods make the trait unusable as `dyn Codec`. That is why
/// `SessionManager` takes the codec as a type parameter (defaulting to
/// [`JsonCodec`]) instead of boxing it like the stores.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Serializes a value into a string record.
    ///
    /// # Errors
    /// Fails like [`Codec::encode`], or with `InvalidMessage` if the codec
    /// produced bytes that are not UTF-8.
    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes)
            .map_err(|_| ProtocolError::InvalidMessage("encoded record is not UTF-8".into()))
    }

    /// Deserializes a string record.
    ///
    /// # Errors
    /// Fails like [`Codec::decode`].
    fn decode_text<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        self.decode(text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON keeps the persisted record readable: the identity stored under
/// `user` can be inspected (or hand-edited) with any text editor, and it
/// matches what the dashboard's web build writes.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use vigil_protocol::{Codec, Identity, JsonCodec, UserId};
///
/// let codec = JsonCodec;
/// let identity = Identity::new(UserId::from("42"), "alice");
///
/// let text = codec.encode_text(&identity).unwrap();
/// assert_eq!(text, r#"{"id":"42","username":"alice"}"#);
///
/// let decoded: Identity = codec.decode_text(&text).unwrap();
/// assert_eq!(identity, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
