//! Credential exchange hook.
//!
//! The session core doesn't talk to the network itself. It depends on an
//! [`AuthTransport`]: two async operations, `login` and `register`, that
//! return either a structured success or a classified [`AuthFailure`].
//! `vigil-http` provides the real implementation; tests script their own.
//!
//! # Why a trait?
//!
//! The state machine is the part worth testing, and it should not need a
//! server to do so. With the transport behind a trait we can:
//! - Use the reqwest-backed `HttpAuthTransport` in the dashboard
//! - Use a transport that parks on a `Notify` to hold a login in flight
//!   while a forced logout lands
//! - Use a fixed-answer transport in doc examples
//!
//! None of that touches `SessionManager`.

use std::fmt;

use vigil_protocol::{Credential, LoginGrant, Registration};

/// Exchanges credentials with the authentication server.
///
/// # Trait bounds
///
/// - `Send + Sync` → the transport lives inside a `SessionManager` that is
///   shared by `Arc`, so any holder may start a login from any thread.
/// - `'static` → it borrows nothing temporary; it lives as long as the
///   session manager does.
///
/// # Why `impl Future + Send` instead of `async fn`?
///
/// An `async fn` in a trait says nothing about whether its future is
/// `Send`. Spelling out the return type makes `Send` part of the contract,
/// so callers can `tokio::spawn` a login. Implementors still write plain
/// `async fn`, as in the example below.
///
/// # Failures
///
/// Return an [`AuthFailure`], never panic. The session manager relies on
/// every call resolving so it can leave `Authenticating`.
///
/// # Example
///
/// ```rust
/// use vigil_protocol::{Credential, LoginGrant, Registration, Token, UserId};
/// use vigil_session::{AuthFailure, AuthTransport};
///
/// /// Accepts one hard-coded user. For demos only.
/// struct FixedTransport;
///
/// impl AuthTransport for FixedTransport {
///     async fn login(&self, credential: &Credential) -> Result<LoginGrant, AuthFailure> {
///         if credential.username == "admin" && credential.password == "admin" {
///             Ok(LoginGrant {
///                 access_token: Token::new("fixed-token"),
///                 user_id: UserId::from("1"),
///             })
///         } else {
///             Err(AuthFailure::rejected("invalid username or password"))
///         }
///     }
///
///     async fn register(&self, _registration: &Registration) -> Result<(), AuthFailure> {
///         Err(AuthFailure::unknown("registration closed"))
///     }
/// }
/// ```
pub trait AuthTransport: Send + Sync + 'static {
    /// Submits a credential. On success the server grants a token and
    /// names the user id.
    fn login(
        &self,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<LoginGrant, AuthFailure>> + Send;

    /// Creates an account. Registration never logs the user in.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl std::future::Future<Output = Result<(), AuthFailure>> + Send;
}

/// Why a credential exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailureKind {
    /// The server was unreachable or the request timed out.
    NetworkFailure,
    /// The server answered and refused the credential.
    RejectedCredential,
    /// Anything else: malformed response, unexpected status.
    Unknown,
}

impl fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFailure => write!(f, "network failure"),
            Self::RejectedCredential => write!(f, "rejected credential"),
            Self::Unknown => write!(f, "unknown failure"),
        }
    }
}

/// A classified, user-presentable failure from the auth transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AuthFailure {
    kind: AuthFailureKind,
    message: String,
    timed_out: bool,
}

impl AuthFailure {
    pub fn new(kind: AuthFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthFailureKind::NetworkFailure, message)
    }

    /// A network failure with the standard timeout wording.
    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Self::network("connection timed out, check your network connection")
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(AuthFailureKind::RejectedCredential, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AuthFailureKind::Unknown, message)
    }

    pub fn kind(&self) -> AuthFailureKind {
        self.kind
    }

    /// `true` for a network failure caused by the request timing out
    /// rather than the server being unreachable.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    /// Text suitable for showing the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}
