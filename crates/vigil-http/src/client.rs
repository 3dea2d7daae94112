//! Authenticated API requests.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use vigil_protocol::{ApiErrorBody, Codec, JsonCodec, Token};
use vigil_session::{AuthTransport, SessionManager};

use crate::{ApiError, ClientConfig, ForcedLogoutTrigger};

/// A prepared request plus the token it was built with.
///
/// Built by [`ApiClient::request`]. The token is kept so a 401 can be
/// matched against the session that is current when the reply arrives.
pub struct ApiRequest {
    builder: RequestBuilder,
    token: Option<Token>,
}

impl ApiRequest {
    /// Attaches a JSON body.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Self {
        self.map(|b| b.json(body))
    }

    /// Adjusts the underlying `reqwest` builder (query, headers, ...).
    pub fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            builder: f(self.builder),
            token: self.token,
        }
    }

    /// The token attached as `Authorization: Bearer`, if any.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }
}

/// HTTP client for the dashboard API.
///
/// Reads the token from the in-memory session on every request. A 401
/// fires the [`ForcedLogoutTrigger`] before the error is returned, but only
/// while the session still holds the token the request was sent with: a
/// late rejection of an older token never tears down a newer login.
pub struct ApiClient<A: AuthTransport, C: Codec = JsonCodec> {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<SessionManager<A, C>>,
    on_rejected: ForcedLogoutTrigger<A, C>,
}

impl<A: AuthTransport, C: Codec> ApiClient<A, C> {
    /// # Errors
    /// [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionManager<A, C>>,
        on_rejected: ForcedLogoutTrigger<A, C>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            config,
            session,
            on_rejected,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A request to `path` under the base URL, with the bearer token
    /// attached when the session holds one.
    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        let builder = self.http.request(method, self.config.url(path));
        match self.session.token() {
            Some(token) if !token.is_empty() => ApiRequest {
                builder: builder.header(reqwest::header::AUTHORIZATION, token.bearer()),
                token: Some(token),
            },
            _ => ApiRequest {
                builder,
                token: None,
            },
        }
    }

    /// Sends a prepared request and checks the status.
    ///
    /// # Errors
    /// - [`ApiError::AuthExpired`] on 401. The forced logout runs first
    ///   if the rejected token is still the session's token.
    /// - [`ApiError::Status`] for any other non-success status.
    /// - [`ApiError::Timeout`] / [`ApiError::Network`] if no response came.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let ApiRequest { builder, token } = request;
        let response = builder.send().await.map_err(ApiError::from_send)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            if self.rejects_current_session(token.as_ref()) {
                // The navigation outcome is logged by the trigger; the
                // caller only needs to know the session is gone.
                let _ = self.on_rejected.fire();
            } else {
                tracing::debug!("401 for a token no longer in use, session kept");
            }
            return Err(ApiError::AuthExpired);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .reason()
            .map(str::to_owned)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
        tracing::debug!(%status, %message, "api request failed");
        Err(ApiError::Status { status, message })
    }

    /// `GET path`, decoding the JSON body.
    ///
    /// # Errors
    /// See [`send`](Self::send); also [`ApiError::Decode`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// `POST path` with a JSON body, decoding the JSON reply.
    ///
    /// # Errors
    /// See [`send`](Self::send); also [`ApiError::Decode`].
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// `true` if a 401 for a request sent with `sent` applies to the
    /// session as it is now.
    fn rejects_current_session(&self, sent: Option<&Token>) -> bool {
        match sent {
            Some(sent) => self.session.token().as_ref() == Some(sent),
            None => false,
        }
    }
}
