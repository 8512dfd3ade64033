use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::http::HttpRequest;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_DELTA: Duration = Duration::from_secs(10);

/// A bearer credential issued by the login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
    /// Known only to the caller; the login response does not carry it.
    #[serde(skip)]
    pub expiry: Option<SystemTime>,
}

impl Token {
    pub fn token_type(&self) -> &'static str {
        "Bearer"
    }

    /// Sets `Authorization: Bearer <access_token>` on `request`.
    pub fn set_auth_header(&self, request: &mut HttpRequest) {
        request.set_header(
            "Authorization",
            format!("{} {}", self.token_type(), self.access_token),
        );
    }

    /// Non-empty and not about to expire.
    pub fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expiry {
            Some(expiry) => SystemTime::now() + EXPIRY_DELTA < expiry,
            None => true,
        }
    }
}

/// Supplies the token for each outgoing request.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Result<Token, AuthError>;
}

/// Always hands out the same token; it is never refreshed.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: Token,
}

impl StaticTokenSource {
    pub fn new(token: Token) -> Self {
        Self { token }
    }
}

impl TokenSource for StaticTokenSource {
    fn token(&self) -> Result<Token, AuthError> {
        Ok(self.token.clone())
    }
}
