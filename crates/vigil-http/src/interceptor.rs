//! Reaction to "authentication rejected" responses.

use std::sync::Arc;

use vigil_nav::{Location, NavigationConfig, NavigationError, Navigator};
use vigil_protocol::{Codec, JsonCodec};
use vigil_session::{AuthTransport, SessionManager};

/// Logs the session out and sends the user to login, carrying the page
/// they were on as the redirect target.
///
/// Fired by [`ApiClient`](crate::ApiClient) on every 401. Safe to fire
/// repeatedly: a logout while already logged out only clears storage again.
pub struct ForcedLogoutTrigger<A: AuthTransport, C: Codec = JsonCodec> {
    session: Arc<SessionManager<A, C>>,
    navigator: Arc<dyn Navigator>,
    config: NavigationConfig,
}

impl<A: AuthTransport, C: Codec> Clone for ForcedLogoutTrigger<A, C> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            navigator: Arc::clone(&self.navigator),
            config: self.config.clone(),
        }
    }
}

impl<A: AuthTransport, C: Codec> ForcedLogoutTrigger<A, C> {
    pub fn new(
        session: Arc<SessionManager<A, C>>,
        navigator: Arc<dyn Navigator>,
        config: NavigationConfig,
    ) -> Self {
        Self {
            session,
            navigator,
            config,
        }
    }

    /// Forces the logout, then pushes the login page.
    ///
    /// The session is already logged out when this returns, even if the
    /// navigation fails.
    ///
    /// # Errors
    /// Whatever the navigator reports for the push to login.
    pub fn fire(&self) -> Result<Location, NavigationError> {
        let here = self.navigator.current();
        tracing::info!(at = %here, "server rejected session token, forcing logout");

        self.session.force_logout();

        let login = self.login_from(&here);
        self.navigator.push(login).inspect_err(|e| {
            tracing::warn!(error = %e, "could not navigate to login after forced logout");
        })
    }

    /// Login page for a user currently at `here`. Already being on login
    /// keeps whatever redirect target was there.
    fn login_from(&self, here: &Location) -> Location {
        if here.path() == self.config.login_path {
            return here.clone();
        }
        Location::new(&self.config.login_path)
            .with_query(self.config.redirect_param.clone(), here.full_path())
    }
}
