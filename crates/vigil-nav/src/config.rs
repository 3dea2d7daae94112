//! Route table and navigation configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NavigationConfig
// ---------------------------------------------------------------------------

/// The well-known destinations the guard redirects between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Where unauthenticated users are sent.
    pub login_path: String,

    /// The sign-up page. Like login, pointless once authenticated.
    pub register_path: String,

    /// Default authenticated landing page.
    pub landing_path: String,

    /// Query parameter carrying the "redirect back to" target.
    pub redirect_param: String,

    /// Hops allowed before a navigation is declared a redirect loop.
    pub max_redirects: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".into(),
            register_path: "/register".into(),
            landing_path: "/home".into(),
            redirect_param: "redirect".into(),
            max_redirects: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Unauthenticated visitors are bounced to login.
    #[serde(default)]
    pub requires_auth: bool,

    /// Static alias: navigating here goes to this path instead.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

impl Route {
    /// A page anyone can see.
    pub fn public(path: &str, name: &str) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            requires_auth: false,
            redirect_to: None,
        }
    }

    /// A page that needs a logged-in user.
    pub fn protected(path: &str, name: &str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(path, name)
        }
    }

    /// An alias for another path.
    pub fn redirect(path: &str, target: &str) -> Self {
        Self {
            path: path.into(),
            name: None,
            requires_auth: false,
            redirect_to: Some(target.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// Exact-match route lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The monitoring dashboard's pages.
    pub fn dashboard() -> Self {
        Self::new(vec![
            Route::redirect("/", "/login"),
            Route::protected("/home", "home"),
            Route::protected("/about", "about"),
            Route::protected("/face", "face"),
            Route::protected("/monitor", "monitor"),
            Route::public("/login", "login"),
            Route::public("/register", "register"),
            Route::protected("/alert", "alert"),
            Route::protected("/device", "device"),
        ])
    }

    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Unknown paths carry no access requirement.
    pub fn requires_auth(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|r| r.requires_auth)
    }

    /// The alias target for `path`, if it is an alias.
    pub fn alias_target(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(|r| r.redirect_to.as_deref())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}
