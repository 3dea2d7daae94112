//! Payload types for Vigil.
//!
//! Two kinds of data cross a boundary in the session core:
//!
//! - **API payloads** exchanged with the authentication server
//!   ([`Credential`], [`Registration`], [`LoginGrant`], [`ApiErrorBody`]);
//! - **persisted records** written to the durable store ([`Identity`]).
//!
//! The [`Codec`] trait turns either into bytes and back. [`JsonCodec`] is
//! the only implementation, matching what the server speaks.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ApiErrorBody, Credential, Identity, LoginGrant, MailCodeRequest, Registration, Token, UserId,
};
