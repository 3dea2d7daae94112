//! Error types for API calls made through [`ApiClient`](crate::ApiClient).

/// Errors from authenticated API requests.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// The server could not be reached.
    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server rejected the session's token. The session has already
    /// been logged out and the user sent to login.
    #[error("authentication expired")]
    AuthExpired,

    /// Any other non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// Maps a send-side `reqwest` failure.
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}
