//! The navigation guard: allow, deny, or redirect each navigation.

use std::sync::Arc;

use vigil_protocol::Codec;
use vigil_session::{AuthTransport, SessionManager};

use crate::{Location, NavigationConfig, NavigationError, RouteTable};

/// What the guard needs to know about the session.
///
/// Implemented for [`SessionManager`]; tests can supply a fixed answer.
pub trait AuthStatus: Send + Sync {
    /// The authenticated flag, read from the in-memory session.
    fn is_authenticated(&self) -> bool;

    /// `true` once boot-time initialization has completed.
    fn is_ready(&self) -> bool;
}

impl<A: AuthTransport, C: Codec> AuthStatus for SessionManager<A, C> {
    fn is_authenticated(&self) -> bool {
        SessionManager::is_authenticated(self)
    }

    fn is_ready(&self) -> bool {
        self.is_initialized()
    }
}

/// The guard's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavDecision {
    Proceed,
    Redirect(Location),
}

/// Evaluates every navigation attempt against the route table.
///
/// Rules, in order:
/// 1. Destination requires auth, user is not authenticated → login, with
///    the original destination in the redirect parameter.
/// 2. User is authenticated and the destination is login or register →
///    the landing page.
/// 3. Otherwise proceed.
pub struct NavigationGuard {
    auth: Arc<dyn AuthStatus>,
    routes: RouteTable,
    config: NavigationConfig,
}

impl NavigationGuard {
    pub fn new(auth: Arc<dyn AuthStatus>, routes: RouteTable, config: NavigationConfig) -> Self {
        Self {
            auth,
            routes,
            config,
        }
    }

    /// Decides whether navigating to `to` may proceed.
    ///
    /// # Errors
    /// Returns [`NavigationError::NotReady`] if the session has not been
    /// initialized: a decision made before boot would read a state that is
    /// about to change.
    pub fn decide(&self, to: &Location) -> Result<NavDecision, NavigationError> {
        if !self.auth.is_ready() {
            return Err(NavigationError::NotReady);
        }

        let authenticated = self.auth.is_authenticated();
        let requires_auth = self.routes.requires_auth(to.path());

        let decision = if requires_auth && !authenticated {
            NavDecision::Redirect(self.login_redirect(to))
        } else if !requires_auth && authenticated && self.is_auth_page(to.path()) {
            NavDecision::Redirect(self.landing())
        } else {
            NavDecision::Proceed
        };

        tracing::debug!(
            to = %to,
            requires_auth,
            authenticated,
            ?decision,
            "navigation checked"
        );
        Ok(decision)
    }

    /// The login page, remembering `from` as the place to come back to.
    pub fn login_redirect(&self, from: &Location) -> Location {
        Location::new(&self.config.login_path)
            .with_query(self.config.redirect_param.clone(), from.full_path())
    }

    /// Where to go after a successful login made from `current`: the
    /// redirect parameter if it names an internal page, else the landing
    /// page.
    pub fn post_login_destination(&self, current: &Location) -> Location {
        match current.query(&self.config.redirect_param) {
            Some(target) if Location::is_internal(target) => Location::parse(target),
            Some(target) => {
                tracing::warn!(target, "ignoring external redirect target");
                self.landing()
            }
            None => self.landing(),
        }
    }

    pub fn landing(&self) -> Location {
        Location::new(&self.config.landing_path)
    }

    pub fn login(&self) -> Location {
        Location::new(&self.config.login_path)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    fn is_auth_page(&self, path: &str) -> bool {
        path == self.config.login_path || path == self.config.register_path
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// A switchable auth flag.
    struct Flag {
        authenticated: AtomicBool,
        ready: AtomicBool,
    }

    impl Flag {
        fn new(authenticated: bool) -> Arc<Self> {
            Arc::new(Self {
                authenticated: AtomicBool::new(authenticated),
                ready: AtomicBool::new(true),
            })
        }
    }

    impl AuthStatus for Flag {
        fn is_authenticated(&self) -> bool {
            self.authenticated.load(Ordering::SeqCst)
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }
    }

    fn guard(flag: Arc<Flag>) -> NavigationGuard {
        NavigationGuard::new(flag, RouteTable::dashboard(), NavigationConfig::default())
    }

    #[test]
    fn test_decide_protected_unauthenticated_redirects_to_login() {
        let guard = guard(Flag::new(false));

        let decision = guard.decide(&Location::new("/monitor")).unwrap();

        let NavDecision::Redirect(to) = decision else {
            panic!("expected redirect");
        };
        assert_eq!(to.path(), "/login");
        assert_eq!(to.query("redirect"), Some("/monitor"));
    }

    #[test]
    fn test_decide_protected_keeps_full_path_in_redirect() {
        let guard = guard(Flag::new(false));

        let decision = guard.decide(&Location::parse("/alert?level=high")).unwrap();

        assert_eq!(
            decision,
            NavDecision::Redirect(
                Location::new("/login").with_query("redirect", "/alert?level=high")
            )
        );
    }

    #[test]
    fn test_decide_protected_authenticated_proceeds() {
        let guard = guard(Flag::new(true));
        assert_eq!(guard.decide(&Location::new("/home")).unwrap(), NavDecision::Proceed);
    }

    #[test]
    fn test_decide_login_while_authenticated_goes_to_landing() {
        let guard = guard(Flag::new(true));

        assert_eq!(
            guard.decide(&Location::new("/login")).unwrap(),
            NavDecision::Redirect(Location::new("/home"))
        );
        assert_eq!(
            guard.decide(&Location::new("/register")).unwrap(),
            NavDecision::Redirect(Location::new("/home"))
        );
    }

    #[test]
    fn test_decide_public_unauthenticated_proceeds() {
        let guard = guard(Flag::new(false));
        assert_eq!(guard.decide(&Location::new("/login")).unwrap(), NavDecision::Proceed);
        assert_eq!(guard.decide(&Location::new("/register")).unwrap(), NavDecision::Proceed);
    }

    #[test]
    fn test_decide_unknown_path_proceeds_either_way() {
        assert_eq!(
            guard(Flag::new(false)).decide(&Location::new("/x")).unwrap(),
            NavDecision::Proceed
        );
        assert_eq!(
            guard(Flag::new(true)).decide(&Location::new("/x")).unwrap(),
            NavDecision::Proceed
        );
    }

    #[test]
    fn test_decide_before_boot_is_not_ready() {
        let flag = Flag::new(true);
        flag.ready.store(false, Ordering::SeqCst);

        let result = guard(flag).decide(&Location::new("/home"));

        assert_eq!(result, Err(NavigationError::NotReady));
    }

    #[test]
    fn test_decide_reflects_flag_flip_immediately() {
        let flag = Flag::new(true);
        let guard = guard(Arc::clone(&flag));
        assert_eq!(guard.decide(&Location::new("/home")).unwrap(), NavDecision::Proceed);

        flag.authenticated.store(false, Ordering::SeqCst);

        assert!(matches!(
            guard.decide(&Location::new("/home")).unwrap(),
            NavDecision::Redirect(_)
        ));
    }

    #[test]
    fn test_post_login_destination_uses_internal_redirect() {
        let guard = guard(Flag::new(true));
        let current = Location::new("/login").with_query("redirect", "/device?id=3");

        let dest = guard.post_login_destination(&current);

        assert_eq!(dest.path(), "/device");
        assert_eq!(dest.query("id"), Some("3"));
    }

    #[test]
    fn test_post_login_destination_rejects_external_redirect() {
        let guard = guard(Flag::new(true));
        let current = Location::new("/login").with_query("redirect", "//evil.example/x");

        assert_eq!(guard.post_login_destination(&current), Location::new("/home"));
    }

    #[test]
    fn test_post_login_destination_defaults_to_landing() {
        let guard = guard(Flag::new(true));
        assert_eq!(
            guard.post_login_destination(&Location::new("/login")),
            Location::new("/home")
        );
    }
}
