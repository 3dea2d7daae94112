//! Client configuration.

use std::time::Duration;

/// Where the API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:5000/api/v1.0`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Path of the login endpoint, relative to `base_url`.
    pub login_path: String,

    /// Path of the sign-up endpoint, relative to `base_url`.
    pub register_path: String,

    /// Path of the endpoint that mails a sign-up verification code.
    pub mailcode_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/v1.0".into(),
            timeout: Duration::from_secs(15),
            login_path: "/login".into(),
            register_path: "/signin".into(),
            mailcode_path: "/mailcode".into(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `VIGIL_API_BASE_URL` and
    /// `VIGIL_API_TIMEOUT_SECS`. Unparsable values are ignored with a
    /// warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("VIGIL_API_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_owned();
        }

        if let Some(raw) = lookup("VIGIL_API_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid VIGIL_API_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
