//! Credential exchange and request authorization.
//!
//! # Overview
//! `Config::new_token_from_credentials` trades a username and API key for a
//! [`Token`] at the login endpoint. Wrap a transport in [`AuthTransport`]
//! with a [`TokenSource`] to authorize every request a `Client` sends.
//!
//! ```rust,ignore
//! let ctx = Context::background();
//! let token = auth::Config::new().new_token_from_credentials(&ctx, "user", "api-key")?;
//! let client = Client::builder()
//!     .transport(auth::authenticated(StaticTokenSource::new(token)))
//!     .build()?;
//! ```

mod token;
mod transport;

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::client::JSON_MEDIA_TYPE;
use crate::context::Context;
use crate::error::AuthError;
use crate::http::{HttpMethod, HttpRequest, Transport, UreqTransport};

pub use token::{StaticTokenSource, Token, TokenSource};
pub use transport::{authenticated, AuthTransport};

pub const DEFAULT_AUTH_URL: &str =
    "https://realm.mongodb.com/api/admin/v3.0/auth/providers/mongodb-cloud/login";

/// Upper bound on how much of a login response is read.
const MAX_BODY_SLURP_SIZE: usize = 1 << 20;

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    username: &'a str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

/// Login endpoint settings.
pub struct Config {
    transport: Arc<dyn Transport>,
    auth_url: String,
}

impl Config {
    /// Public cloud login over the default transport.
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }

    /// Overrides the login URL.
    pub fn auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    /// Exchanges programmatic API credentials for a token.
    ///
    /// ## Errors
    ///
    /// - `AuthError::Context` / `Transport` when the exchange fails.
    /// - `AuthError::Retrieve` when the status is outside 2xx.
    /// - `AuthError::Decode` / `MissingAccessToken` when the body holds no
    ///   usable token.
    #[instrument(level = "debug", skip_all, fields(url = %self.auth_url))]
    pub fn new_token_from_credentials(
        &self,
        ctx: &Context,
        username: &str,
        api_key: &str,
    ) -> Result<Token, AuthError> {
        let request = self.new_auth_request(&AuthenticateRequest { username, api_key })?;
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let response = match self.transport.execute(ctx, request) {
            Ok(response) => response,
            Err(err) => {
                if let Some(ctx_err) = ctx.err() {
                    return Err(ctx_err.into());
                }
                return Err(err.into());
            }
        };

        let body = &response.body[..response.body.len().min(MAX_BODY_SLURP_SIZE)];
        if !response.is_success() {
            return Err(AuthError::Retrieve {
                status: response.status,
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }

        let token: Token = serde_json::from_slice(body).map_err(AuthError::Decode)?;
        if token.access_token.is_empty() {
            return Err(AuthError::MissingAccessToken);
        }
        tracing::debug!(user_id = %token.user_id, "token issued");
        Ok(token)
    }

    fn new_auth_request(&self, credentials: &AuthenticateRequest<'_>) -> Result<HttpRequest, AuthError> {
        let url = Url::parse(&self.auth_url)?;
        let mut body = serde_json::to_string(credentials).map_err(AuthError::Serialization)?;
        body.push('\n');

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string()),
                ("Accept".to_string(), JSON_MEDIA_TYPE.to_string()),
            ],
            body: Some(body),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
