//! `Dashboard` builder and composition root.
//!
//! This is the entry point for running the session core. It ties together
//! the layers in boot order: storage → session → guard → router.

use std::sync::Arc;

use vigil_http::{ApiClient, ClientConfig, ForcedLogoutTrigger};
use vigil_nav::{
    AuthStatus, HistoryRouter, Location, NavigationConfig, NavigationGuard, Navigator, RouteTable,
};
use vigil_protocol::{Credential, Identity, Registration};
use vigil_session::{AuthTransport, BootOutcome, SessionConfig, SessionManager};
use vigil_storage::KeyValueStore;

use crate::VigilError;

/// Builder for configuring and booting a [`Dashboard`].
///
/// # Example
///
/// ```rust,ignore
/// use vigil::prelude::*;
///
/// let dashboard = Dashboard::builder()
///     .session_config(SessionConfig::default())
///     .boot(transport, durable, MemoryStore::session(), Location::new("/home"))?;
/// ```
pub struct DashboardBuilder {
    session_config: SessionConfig,
    navigation_config: NavigationConfig,
    routes: RouteTable,
}

impl DashboardBuilder {
    /// Creates a new builder with the dashboard's default routes.
    pub fn new() -> Self {
        Self {
            session_config: SessionConfig::default(),
            navigation_config: NavigationConfig::default(),
            routes: RouteTable::dashboard(),
        }
    }

    /// Sets the storage key names and retry policy.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the login/landing paths and redirect handling.
    pub fn navigation_config(mut self, config: NavigationConfig) -> Self {
        self.navigation_config = config;
        self
    }

    /// Replaces the route table.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Boots the dashboard and navigates to `entry`.
    ///
    /// `initialize()` runs to completion before the guard exists, so the
    /// first navigation decision sees the settled session.
    ///
    /// # Errors
    /// [`VigilError::Navigation`] if the first navigation cannot settle.
    pub fn boot<A: AuthTransport>(
        self,
        transport: A,
        durable: impl KeyValueStore,
        ephemeral: impl KeyValueStore,
        entry: Location,
    ) -> Result<Dashboard<A>, VigilError> {
        let session = Arc::new(SessionManager::new(
            transport,
            durable,
            ephemeral,
            self.session_config,
        ));
        let boot_outcome = session.initialize();

        let guard = Arc::new(NavigationGuard::new(
            Arc::clone(&session) as Arc<dyn AuthStatus>,
            self.routes,
            self.navigation_config.clone(),
        ));
        let router = Arc::new(HistoryRouter::new(guard));
        let on_rejected = ForcedLogoutTrigger::new(
            Arc::clone(&session),
            Arc::clone(&router) as Arc<dyn Navigator>,
            self.navigation_config,
        );

        let landed = router.push(entry)?;
        tracing::info!(?boot_outcome, at = %landed, "dashboard booted");

        Ok(Dashboard {
            session,
            router,
            on_rejected,
            boot_outcome,
        })
    }
}

impl Default for DashboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A booted dashboard: one tab's session, router, and forced-logout hook.
pub struct Dashboard<A: AuthTransport> {
    session: Arc<SessionManager<A>>,
    router: Arc<HistoryRouter>,
    on_rejected: ForcedLogoutTrigger<A>,
    boot_outcome: BootOutcome,
}

impl<A: AuthTransport> Dashboard<A> {
    /// Creates a new builder.
    pub fn builder() -> DashboardBuilder {
        DashboardBuilder::new()
    }

    /// Logs in and leaves the login page.
    ///
    /// The current history entry is replaced by the page named in the
    /// redirect parameter (internal paths only), or the landing page.
    ///
    /// # Errors
    /// [`VigilError::Session`] with the classified failure if login fails;
    /// the user stays where they are.
    pub async fn login(&self, credential: &Credential) -> Result<Identity, VigilError> {
        let identity = self.session.login(credential).await?;

        let destination = self
            .router
            .guard()
            .post_login_destination(&self.router.current());
        self.router.replace(destination)?;

        Ok(identity)
    }

    /// Creates an account. Does not log in or navigate.
    ///
    /// # Errors
    /// [`VigilError::Session`] with the classified failure.
    pub async fn register(&self, registration: &Registration) -> Result<(), VigilError> {
        self.session.register(registration).await?;
        Ok(())
    }

    /// Logs out and pushes the login page.
    ///
    /// # Errors
    /// [`VigilError::Navigation`] if the router cannot reach login. The
    /// session is logged out regardless.
    pub fn logout(&self) -> Result<Location, VigilError> {
        self.session.logout();
        let login = self.router.guard().login();
        Ok(self.router.push(login)?)
    }

    /// Navigates through the guard and returns where the user landed.
    ///
    /// # Errors
    /// [`VigilError::Navigation`] on a redirect loop.
    pub fn navigate(&self, to: impl Into<Location>) -> Result<Location, VigilError> {
        Ok(self.router.push(to.into())?)
    }

    /// An API client that shares this dashboard's session and fires the
    /// forced logout on 401.
    ///
    /// # Errors
    /// [`VigilError::Api`] if the HTTP client cannot be built.
    pub fn api_client(&self, config: ClientConfig) -> Result<ApiClient<A>, VigilError> {
        Ok(ApiClient::new(
            config,
            Arc::clone(&self.session),
            self.on_rejected.clone(),
        )?)
    }

    pub fn current(&self) -> Location {
        self.router.current()
    }

    pub fn session(&self) -> &Arc<SessionManager<A>> {
        &self.session
    }

    pub fn router(&self) -> &Arc<HistoryRouter> {
        &self.router
    }

    /// The hook fired when the server rejects the session's token.
    pub fn forced_logout(&self) -> &ForcedLogoutTrigger<A> {
        &self.on_rejected
    }

    /// What `initialize()` found at boot.
    pub fn boot_outcome(&self) -> BootOutcome {
        self.boot_outcome
    }
}
