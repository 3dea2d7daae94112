//! Unified error type for Vigil.

use vigil_http::ApiError;
use vigil_nav::NavigationError;
use vigil_protocol::ProtocolError;
use vigil_session::{AuthFailure, SessionError};
use vigil_storage::StorageError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// A storage backend failed (file read/write, encoding).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth failure, invalid state, superseded).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A navigation error (not ready, redirect loop).
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// An API request error (network, status, expired auth).
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<AuthFailure> for VigilError {
    fn from(failure: AuthFailure) -> Self {
        Self::Session(SessionError::Auth(failure))
    }
}

impl VigilError {
    /// The classified auth failure behind this error, if any. This is
    /// what a login form shows the user.
    pub fn auth_failure(&self) -> Option<&AuthFailure> {
        match self {
            Self::Session(SessionError::Auth(failure)) => Some(failure),
            _ => None,
        }
    }
}
