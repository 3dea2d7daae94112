//! Navigation and access control for Vigil.
//!
//! - [`NavigationGuard`] decides, for each navigation attempt, whether to
//!   proceed or redirect, from the destination's access requirement and the
//!   session's authenticated flag ([`AuthStatus`]).
//! - [`HistoryRouter`] is the in-process router: it follows static route
//!   redirects, consults the guard, and records the resulting history. It
//!   implements [`Navigator`], the handle other components (the
//!   forced-logout trigger, the dashboard) use to move the user around.
//!
//! The guard only reads the in-memory session. It never looks at storage.

mod config;
mod error;
mod guard;
mod location;
mod router;

pub use config::{NavigationConfig, Route, RouteTable};
pub use error::NavigationError;
pub use guard::{AuthStatus, NavDecision, NavigationGuard};
pub use location::Location;
pub use router::{HistoryRouter, NavMode, Navigator};
