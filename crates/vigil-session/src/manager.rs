//! The session manager: the authoritative authentication state machine.
//!
//! It's responsible for:
//! - Deciding the initial state at boot from the durable store and the
//!   continuity marker
//! - Running login/register through the auth transport
//! - Tearing the session down on logout, user-initiated or forced
//! - Mirroring every change into the durable and ephemeral stores
//!
//! # Concurrency note
//!
//! All state lives behind one `Mutex`, and the lock is only ever held for a
//! synchronous block: never across the transport's `.await`. So every
//! transition is atomic with respect to any other caller, and a navigation
//! check can never observe a half-finished logout.
//!
//! The one suspension point is the in-flight login. A logout that lands
//! there bumps `generation`; when the login resumes it sees the generation
//! moved on and discards its result instead of resurrecting the session.

use std::sync::{Mutex, MutexGuard, PoisonError};

use vigil_protocol::{Codec, Credential, Identity, JsonCodec, Registration, Token};
use vigil_storage::{Durability, KeyValueStore, StorageError};

use crate::{
    AuthFailure, AuthTransport, LogoutReason, Session, SessionConfig, SessionError, SessionState,
};

/// What `initialize()` found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// A token from this browsing session was restored.
    Resumed,
    /// Nothing was persisted; logged out.
    SignedOut,
    /// A token survived from a previous, fully closed browser session and
    /// was wiped.
    StaleCredentialCleared,
    /// The persisted record was unreadable and was deleted; logged out.
    CorruptRecordCleared,
    /// A login is in flight; the call changed nothing.
    LoginInFlight,
}

struct Inner {
    state: SessionState,
    session: Session,
    /// Incremented on every teardown. A login commits only if this is
    /// unchanged since it started.
    generation: u64,
    initialized: bool,
}

/// Owns the session and coordinates it with storage and the transport.
///
/// Shared by handle (`Arc<SessionManager<_>>`) with the navigation guard
/// and the forced-logout trigger; there is no global instance.
///
/// ## Lifecycle
///
/// ```text
/// initialize() ──→ [LoggedOut | Authenticated]
///                        │            │
///              login() ──┘            └── logout() / force_logout()
///                        │                          │
///                        ▼                          ▼
///                 [Authenticated]              [LoggedOut]
/// ```
pub struct SessionManager<A: AuthTransport, C: Codec = JsonCodec> {
    transport: A,
    codec: C,
    durable: Box<dyn KeyValueStore>,
    ephemeral: Box<dyn KeyValueStore>,
    config: SessionConfig,
    inner: Mutex<Inner>,
}

impl<A: AuthTransport> SessionManager<A> {
    /// Creates a logged-out manager that persists identity as JSON.
    ///
    /// Nothing is read from storage until [`initialize`](Self::initialize).
    pub fn new(
        transport: A,
        durable: impl KeyValueStore,
        ephemeral: impl KeyValueStore,
        config: SessionConfig,
    ) -> Self {
        Self::with_codec(transport, JsonCodec, durable, ephemeral, config)
    }
}

impl<A: AuthTransport, C: Codec> SessionManager<A, C> {
    /// Creates a logged-out manager with a custom identity codec.
    pub fn with_codec(
        transport: A,
        codec: C,
        durable: impl KeyValueStore,
        ephemeral: impl KeyValueStore,
        config: SessionConfig,
    ) -> Self {
        for problem in lifetime_mismatches(durable.durability(), ephemeral.durability()) {
            tracing::warn!(problem, "session stores have unexpected lifetimes");
        }

        Self {
            transport,
            codec,
            durable: Box::new(durable),
            ephemeral: Box::new(ephemeral),
            config,
            inner: Mutex::new(Inner {
                state: SessionState::LoggedOut,
                session: Session::empty(),
                generation: 0,
                initialized: false,
            }),
        }
    }

    // =====================================================================
    // Operations
    // =====================================================================

    /// Decides the initial state. Run once at boot, before the first
    /// navigation decision.
    ///
    /// - Token persisted but no continuity marker: the browser was closed
    ///   since that login. The token is wiped and the session stays
    ///   logged out.
    /// - Otherwise whatever was persisted (possibly nothing) is adopted and
    ///   the marker is written, so a second call is a no-op in effect.
    /// - An unreadable record counts as "nothing persisted" and is deleted.
    pub fn initialize(&self) -> BootOutcome {
        let mut inner = self.lock();

        if inner.state == SessionState::Authenticating {
            tracing::debug!("initialize skipped: login in flight");
            return BootOutcome::LoginInFlight;
        }

        let has_marker = self.marker_present();

        let outcome = match self.load_persisted() {
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted session");
                self.clear_durable();
                inner.session = Session::empty();
                inner.state = SessionState::LoggedOut;
                self.write_marker();
                BootOutcome::CorruptRecordCleared
            }
            Ok(Some(_)) if !has_marker => {
                self.invalidate(&mut inner, LogoutReason::StaleCredential);
                BootOutcome::StaleCredentialCleared
            }
            Ok(Some(session)) => {
                inner.session = session;
                inner.state = SessionState::Authenticated;
                self.write_marker();
                BootOutcome::Resumed
            }
            Ok(None) => {
                inner.session = Session::empty();
                inner.state = SessionState::LoggedOut;
                self.write_marker();
                BootOutcome::SignedOut
            }
        };

        inner.initialized = true;
        tracing::info!(
            state = %inner.state,
            ?outcome,
            user_id = inner.session.identity().map(|i| i.id.as_str()),
            "session initialized"
        );
        outcome
    }

    /// Logs in with `credential`.
    ///
    /// Only valid from `LoggedOut`; a concurrent second call is refused
    /// rather than raced.
    ///
    /// # Errors
    /// - [`SessionError::InvalidState`]: not logged out (login in flight,
    ///   or already authenticated)
    /// - [`SessionError::Auth`]: the transport failed; nothing was changed
    /// - [`SessionError::Superseded`]: a logout landed while the request
    ///   was in flight; the grant was discarded
    pub async fn login(&self, credential: &Credential) -> Result<Identity, SessionError> {
        let generation = {
            let mut inner = self.lock();
            if inner.state != SessionState::LoggedOut {
                return Err(SessionError::InvalidState {
                    operation: "login",
                    state: inner.state,
                });
            }
            inner.state = SessionState::Authenticating;
            inner.generation
        };

        tracing::debug!(username = %credential.username, "login started");
        let result = self.transport.login(credential).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            // Torn down while we were waiting. Whatever state is current
            // now belongs to someone else.
            return match result {
                Ok(_) => {
                    tracing::warn!(
                        username = %credential.username,
                        "login succeeded after logout, discarding grant"
                    );
                    Err(SessionError::Superseded)
                }
                Err(failure) => Err(SessionError::Auth(failure)),
            };
        }

        let grant = match result {
            Ok(grant) if grant.access_token.is_empty() => {
                inner.state = SessionState::LoggedOut;
                tracing::warn!("login response carried an empty token");
                return Err(AuthFailure::unknown("server returned an empty token").into());
            }
            Ok(grant) => grant,
            Err(failure) => {
                inner.state = SessionState::LoggedOut;
                tracing::info!(
                    username = %credential.username,
                    kind = %failure.kind(),
                    "login failed"
                );
                return Err(failure.into());
            }
        };

        let identity = Identity::new(grant.user_id, credential.username.clone());
        inner.session = Session::authenticated(grant.access_token, identity.clone());
        inner.state = SessionState::Authenticated;
        inner.initialized = true;
        self.persist(&inner.session);
        self.write_marker();

        tracing::info!(user_id = %identity.id, username = %identity.username, "logged in");
        Ok(identity)
    }

    /// Creates an account. Does not log in and never touches the session.
    ///
    /// # Errors
    /// - [`SessionError::InvalidState`]: a login is in flight
    /// - [`SessionError::Auth`]: the transport failed
    pub async fn register(&self, registration: &Registration) -> Result<(), SessionError> {
        {
            let inner = self.lock();
            if inner.state == SessionState::Authenticating {
                return Err(SessionError::InvalidState {
                    operation: "register",
                    state: inner.state,
                });
            }
        }

        match self.transport.register(registration).await {
            Ok(()) => {
                tracing::info!(username = %registration.username, "account registered");
                Ok(())
            }
            Err(failure) => {
                tracing::info!(
                    username = %registration.username,
                    kind = %failure.kind(),
                    "registration failed"
                );
                Err(failure.into())
            }
        }
    }

    /// Logs out. Valid from any state.
    pub fn logout(&self) {
        let mut inner = self.lock();
        self.invalidate(&mut inner, LogoutReason::User);
    }

    /// Logs out because an API request was rejected as unauthenticated.
    ///
    /// Same transition as [`logout`](Self::logout). If a login is in
    /// flight, its eventual success is discarded.
    pub fn force_logout(&self) {
        let mut inner = self.lock();
        self.invalidate(&mut inner, LogoutReason::Forced);
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// `true` iff a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    /// Returns `true` once `initialize()` (or a successful login) has run.
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    /// The current token, for attaching to outgoing requests.
    pub fn token(&self) -> Option<Token> {
        self.lock().session.token().cloned()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().session.identity().cloned()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves `Inner` consistent before any call
        // that could panic, so a poisoned lock still guards valid state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The shared teardown: `Invalidating` → clear everything → `LoggedOut`.
    /// Runs entirely under the caller's lock.
    fn invalidate(&self, inner: &mut Inner, reason: LogoutReason) {
        let previous = inner.state;
        inner.state = SessionState::Invalidating;
        inner.generation += 1;
        inner.session = Session::empty();

        self.clear_durable();
        self.best_effort("clear continuity marker", || {
            self.ephemeral.remove(&self.config.marker_key)
        });

        inner.state = SessionState::LoggedOut;
        tracing::info!(%reason, %previous, "session invalidated");
    }

    /// Reads the durable record.
    ///
    /// `Ok(None)` when nothing is stored. A token without an identity (or
    /// the reverse), an empty token, or an identity that doesn't parse is
    /// `CorruptPersistedState`. Read failures count as "absent".
    fn load_persisted(&self) -> Result<Option<Session>, SessionError> {
        let token = self.read_durable(&self.config.token_key);
        let identity = self.read_durable(&self.config.identity_key);

        match (token, identity) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(SessionError::CorruptPersistedState(
                "token stored without identity".into(),
            )),
            (None, Some(_)) => Err(SessionError::CorruptPersistedState(
                "identity stored without token".into(),
            )),
            (Some(token), Some(raw)) => {
                if token.is_empty() {
                    return Err(SessionError::CorruptPersistedState("empty token".into()));
                }
                let identity: Identity = self
                    .codec
                    .decode_text(&raw)
                    .map_err(|e| SessionError::CorruptPersistedState(e.to_string()))?;
                Ok(Some(Session::authenticated(Token::new(token), identity)))
            }
        }
    }

    fn read_durable(&self, key: &str) -> Option<String> {
        match self.durable.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "durable read failed, treating as absent");
                None
            }
        }
    }

    fn marker_present(&self) -> bool {
        match self.ephemeral.get(&self.config.marker_key) {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "continuity marker unreadable, treating as new session");
                false
            }
        }
    }

    fn write_marker(&self) {
        self.best_effort("write continuity marker", || {
            self.ephemeral.set(&self.config.marker_key, "true")
        });
    }

    fn persist(&self, session: &Session) {
        let (Some(token), Some(identity)) = (session.token(), session.identity()) else {
            return;
        };

        let record = match self.codec.encode_text(identity) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "identity encode failed, session not persisted");
                return;
            }
        };

        self.best_effort("persist token", || {
            self.durable.set(&self.config.token_key, token.as_str())
        });
        self.best_effort("persist identity", || {
            self.durable.set(&self.config.identity_key, &record)
        });
    }

    fn clear_durable(&self) {
        self.best_effort("clear token", || self.durable.remove(&self.config.token_key));
        self.best_effort("clear identity", || {
            self.durable.remove(&self.config.identity_key)
        });
    }

    /// Runs `op` up to `1 + storage_retries` times. Storage is a mirror: a
    /// final failure is logged, never propagated.
    fn best_effort(&self, what: &str, op: impl Fn() -> Result<(), StorageError>) -> bool {
        let attempts = self.config.storage_retries.saturating_add(1);
        for attempt in 1..=attempts {
            match op() {
                Ok(()) => return true,
                Err(e) if attempt < attempts => {
                    tracing::debug!(what, attempt, error = %e, "storage write failed, retrying");
                }
                Err(e) => {
                    tracing::warn!(what, attempts, error = %e, "storage write failed, giving up");
                }
            }
        }
        false
    }
}

/// Reload/restart detection only works if the durable store outlives the
/// marker store. Returns what is wrong with the pairing, if anything.
fn lifetime_mismatches(durable: Durability, ephemeral: Durability) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if durable == Durability::Session {
        problems.push("durable store is session-scoped, logins will not survive a restart");
    }
    if ephemeral == Durability::Durable {
        problems.push("marker store is durable, stale tokens will never be wiped");
    }
    problems
}

// =========================================================================
// Tests
// =========================================================================
