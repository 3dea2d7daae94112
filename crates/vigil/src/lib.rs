//! # Vigil
//!
//! Client-side authentication session core for the Vigil monitoring
//! dashboard.
//!
//! Vigil owns the user's authentication state, decides whether it survives a
//! page reload or a browser restart, and keeps navigation and API access in
//! step with it. The pieces live in their own crates and are re-exported
//! here:
//!
//! - [`vigil_storage`]: durable and session-scoped key/value stores
//! - [`vigil_protocol`]: wire and persisted data shapes
//! - [`vigil_session`]: the session state machine
//! - [`vigil_nav`]: navigation guard and router
//! - [`vigil_http`]: HTTP auth transport, API client, forced logout
//!
//! [`Dashboard`] wires them together in the right boot order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vigil::prelude::*;
//!
//! # async fn run() -> Result<(), VigilError> {
//! vigil::init_tracing();
//!
//! let transport = HttpAuthTransport::new(ClientConfig::from_env())?;
//! let dashboard = Dashboard::<HttpAuthTransport>::builder().boot(
//!     transport,
//!     FileStore::open("vigil-store.json")?,
//!     MemoryStore::session(),
//!     Location::new("/"),
//! )?;
//!
//! dashboard.login(&Credential::new("alice", "secret")).await?;
//! # Ok(())
//! # }
//! ```

mod dashboard;
mod error;

pub use dashboard::{Dashboard, DashboardBuilder};
pub use error::VigilError;

pub use vigil_http;
pub use vigil_nav;
pub use vigil_protocol;
pub use vigil_session;
pub use vigil_storage;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub mod prelude {
    pub use crate::{Dashboard, DashboardBuilder, VigilError};
    pub use vigil_http::{
        ApiClient, ApiError, ApiRequest, ClientConfig, ForcedLogoutTrigger, HttpAuthTransport,
    };
    pub use vigil_nav::{
        HistoryRouter, Location, NavigationConfig, NavigationError, Navigator, Route, RouteTable,
    };
    pub use vigil_protocol::{Credential, Identity, Registration, Token, UserId};
    pub use vigil_session::{
        AuthFailure, AuthFailureKind, AuthTransport, BootOutcome, SessionConfig, SessionError,
        SessionManager, SessionState,
    };
    pub use vigil_storage::{Durability, FileStore, KeyValueStore, MemoryStore, StorageError};
}
