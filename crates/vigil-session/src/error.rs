//! Error types for the session layer.

use crate::{AuthFailure, SessionState};

/// Errors returned by [`SessionManager`](crate::SessionManager) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The auth transport reported a classified failure. The session was
    /// not modified.
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// The operation's precondition does not hold in the current state,
    /// e.g. a second login while the first is still in flight.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A logout happened while this login was in flight. The server
    /// accepted the credential, but the result was discarded.
    #[error("login superseded by a logout")]
    Superseded,

    /// Persisted session data failed to parse. Never surfaced from boot
    /// (which fails safe to logged-out); kept as a variant for logging.
    #[error("corrupt persisted session: {0}")]
    CorruptPersistedState(String),
}
