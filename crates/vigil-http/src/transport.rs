//! [`AuthTransport`] over HTTP.

use reqwest::StatusCode;
use serde::Serialize;
use vigil_protocol::{ApiErrorBody, Credential, LoginGrant, MailCodeRequest, Registration};
use vigil_session::{AuthFailure, AuthTransport};

use crate::{ApiError, ClientConfig};

const LOGIN_FAILED: &str = "login failed, please retry";
const REGISTER_FAILED: &str = "registration failed";
const MAILCODE_FAILED: &str = "could not send verification code";

/// Talks to the authentication endpoints.
///
/// Login and sign-up never carry a bearer token, so this uses its own
/// request path rather than [`ApiClient`](crate::ApiClient): a 401 here is
/// a bad password, not an expired session.
#[derive(Debug, Clone)]
pub struct HttpAuthTransport {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpAuthTransport {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    /// [`ApiError::Client`] if the TLS backend fails to initialize.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self::with_client(http, config))
    }

    /// Reuses an existing client (shared connection pool).
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Asks the server to mail a sign-up verification code to `email`.
    /// The code goes back in [`Registration::code`].
    ///
    /// Not part of [`AuthTransport`]: it touches no session state.
    ///
    /// # Errors
    /// Classified like [`register`](AuthTransport::register).
    pub async fn request_mail_code(&self, email: &str) -> Result<(), AuthFailure> {
        let response = self
            .post(&self.config.mailcode_path, &MailCodeRequest::new(email))
            .await?;
        let outcome = created_or_failure(response, MAILCODE_FAILED).await;
        if outcome.is_ok() {
            tracing::info!(email, "verification code requested");
        }
        outcome
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, AuthFailure> {
        let url = self.config.url(path);
        tracing::debug!(%url, "auth request");
        self.http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))
    }
}

impl AuthTransport for HttpAuthTransport {
    async fn login(&self, credential: &Credential) -> Result<LoginGrant, AuthFailure> {
        let response = self.post(&self.config.login_path, credential).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(failure_from_response(response, LOGIN_FAILED).await);
        }

        response.json::<LoginGrant>().await.map_err(|e| {
            if e.is_timeout() {
                AuthFailure::timeout()
            } else {
                tracing::warn!(error = %e, "login response did not parse");
                AuthFailure::unknown(LOGIN_FAILED)
            }
        })
    }

    async fn register(&self, registration: &Registration) -> Result<(), AuthFailure> {
        let response = self.post(&self.config.register_path, registration).await?;
        created_or_failure(response, REGISTER_FAILED).await
    }
}

/// Only 200 and 201 count as success for account operations.
async fn created_or_failure(response: reqwest::Response, fallback: &str) -> Result<(), AuthFailure> {
    match response.status() {
        StatusCode::OK | StatusCode::CREATED => Ok(()),
        status if status.is_success() => Err(AuthFailure::unknown(format!(
            "{fallback}: server returned {status}"
        ))),
        _ => Err(failure_from_response(response, fallback).await),
    }
}

/// Transport-level failure: nothing came back.
fn classify_send_error(e: &reqwest::Error) -> AuthFailure {
    if e.is_timeout() {
        AuthFailure::timeout()
    } else if e.is_connect() || e.is_request() {
        tracing::debug!(error = %e, "auth server unreachable");
        AuthFailure::network("cannot reach the server, check your network connection")
    } else {
        AuthFailure::unknown(e.to_string())
    }
}

/// The server answered with an error status. Client errors mean the
/// submitted data was refused; anything else is the server's problem.
async fn failure_from_response(response: reqwest::Response, fallback: &str) -> AuthFailure {
    let status = response.status();
    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    let reason = body.reason();

    tracing::debug!(%status, reason, "auth request refused");

    match reason {
        Some(message) if is_rejection(status, true) => AuthFailure::rejected(message),
        Some(message) => AuthFailure::unknown(message),
        None if is_rejection(status, false) => AuthFailure::rejected(fallback),
        // A bare 404 is a wrong endpoint, not a wrong password.
        None if status == StatusCode::NOT_FOUND => {
            AuthFailure::unknown(format!("{fallback}: endpoint not found"))
        }
        None => AuthFailure::unknown(fallback),
    }
}

/// `explained` is whether the server said why. A 404 only counts as a
/// refusal when it did.
fn is_rejection(status: StatusCode, explained: bool) -> bool {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => true,
        StatusCode::NOT_FOUND => explained,
        _ => false,
    }
}
