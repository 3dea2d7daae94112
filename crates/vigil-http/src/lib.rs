//! HTTP plumbing around the Vigil session core.
//!
//! - [`HttpAuthTransport`]: the auth transport over HTTP: `POST /login`
//!   and `POST /signin`, with failures classified into network, rejected,
//!   and unknown. Also requests sign-up verification codes (`POST /mailcode`).
//! - [`ApiClient`]: every other API call. Attaches the session's bearer
//!   token and hands "authentication rejected" responses to the
//!   [`ForcedLogoutTrigger`], as long as the rejected token is still the
//!   session's current one (see [`ApiRequest`]).
//! - [`ForcedLogoutTrigger`]: logs the session out and sends the user to
//!   login, remembering where they were.

mod client;
mod config;
mod error;
mod interceptor;
mod transport;

pub use client::{ApiClient, ApiRequest};
pub use config::ClientConfig;
pub use error::ApiError;
pub use interceptor::ForcedLogoutTrigger;
pub use transport::HttpAuthTransport;
