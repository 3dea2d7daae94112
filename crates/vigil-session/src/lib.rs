//! Authentication session core for Vigil.
//!
//! This crate owns the answer to "am I logged in", and keeps three things
//! consistent with each other:
//!
//! 1. **The in-memory session** ([`Session`]): the single source of truth
//!    every consumer (navigation guard, API client) reads.
//! 2. **The durable mirror**: token and identity in a store that survives
//!    restarts, so a reload does not log the user out.
//! 3. **The continuity marker**: a flag in a browsing-session-scoped store
//!    that tells a reload apart from a reopened browser. A token found
//!    without the marker is stale and gets wiped.
//!
//! # How it fits in the stack
//!
//! ```text
//! Navigation guard / forced-logout trigger (above)  ← read and reset the session
//!     ↕
//! Session layer (this crate)  ← state machine, storage mirroring
//!     ↕
//! Storage + auth transport (below)  ← key-value stores, credential exchange
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod session;

pub use auth::{AuthFailure, AuthFailureKind, AuthTransport};
pub use error::SessionError;
pub use manager::{BootOutcome, SessionManager};
pub use session::{LogoutReason, Session, SessionConfig, SessionState};
