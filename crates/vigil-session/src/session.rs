//! Session types: what the core knows about the current login.
//!
//! A [`Session`] either holds a token together with the identity it was
//! issued to, or holds nothing. The pairing is structural (one `Option`
//! over both), so "token without user" can't be represented.

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_protocol::{Identity, Token};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Storage layout and retry policy for the session core.
///
/// The key names match what earlier dashboard builds wrote, so an existing
/// durable store is picked up unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Durable-store key holding the raw token.
    pub token_key: String,

    /// Durable-store key holding the JSON identity record.
    pub identity_key: String,

    /// Ephemeral-store key of the continuity marker.
    pub marker_key: String,

    /// Extra attempts after a failed durable write or clear. The in-memory
    /// session is authoritative either way; this only narrows the window in
    /// which the mirror disagrees.
    pub storage_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "token".into(),
            identity_key: "user".into(),
            marker_key: "browserOpened".into(),
            storage_retries: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of the session manager.
///
/// ```text
///              login()                    success
///   LoggedOut ─────────→ Authenticating ──────────→ Authenticated
///       ↑                     │ failure                   │
///       ├─────────────────────┘                           │ logout() / forced
///       │                                                 ▼
///       └─────────────────────────────────────────── Invalidating
/// ```
///
/// `LoggedOut` and `Authenticated` are the steady states. `Invalidating`
/// never outlives the synchronous call that entered it; `Authenticating`
/// lasts exactly as long as the transport's login future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    Authenticated,
    Invalidating,
}

impl SessionState {
    /// Returns `true` for `LoggedOut` and `Authenticated`.
    pub fn is_steady(self) -> bool {
        matches!(self, Self::LoggedOut | Self::Authenticated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => write!(f, "LoggedOut"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Invalidating => write!(f, "Invalidating"),
        }
    }
}

// ---------------------------------------------------------------------------
// LogoutReason
// ---------------------------------------------------------------------------

/// Who asked for the session to be torn down. Only affects logging; every
/// reason runs the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoutReason {
    /// Explicit user action.
    User,
    /// An API request came back "authentication rejected".
    Forced,
    /// Boot found a token left over from a closed browser session.
    StaleCredential,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Forced => write!(f, "forced"),
            Self::StaleCredential => write!(f, "stale credential"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The in-memory record of who is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current: Option<(Token, Identity)>,
}

impl Session {
    /// A logged-out session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A session holding `token`, issued to `identity`.
    pub fn authenticated(token: Token, identity: Identity) -> Self {
        Self {
            current: Some((token, identity)),
        }
    }

    pub fn token(&self) -> Option<&Token> {
        self.current.as_ref().map(|(token, _)| token)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current.as_ref().map(|(_, identity)| identity)
    }

    /// `true` iff a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}
