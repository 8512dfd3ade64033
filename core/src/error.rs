//! Error types for the administration API client.
//!
//! # Design
//! `ApiError` separates the four ways a call can fail: a precondition on the
//! arguments, the transport (or the caller's context), a non-2xx status, and
//! an undecodable body. Non-2xx responses become an `ErrorResponse` carrying
//! whatever the server said about the failure. Login failures have their own
//! `AuthError` because they never pass through `Client`.

use thiserror::Error;

use crate::context::ContextError;
use crate::http::{HttpMethod, TransportError};

/// Errors returned by `Client` and the resource services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required argument was missing; no request was sent.
    #[error("{name} is invalid because {reason}")]
    Argument {
        name: &'static str,
        reason: &'static str,
    },

    /// The configured base URL cannot have relative paths resolved against it.
    #[error("base URL must have a trailing slash, but {0:?} does not")]
    BaseUrl(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The caller's context was canceled or timed out.
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned a status outside 2xx.
    #[error(transparent)]
    Response(#[from] ErrorResponse),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Copying the body into a raw sink failed.
    #[error("writing response body failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The structured server error, when the call failed with a non-2xx status.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Response(response) => Some(response),
            _ => None,
        }
    }
}

/// A non-2xx response.
///
/// `error_code`, `reason` and `detail` come from the JSON error body
/// `{"error_code": .., "reason": .., "error": ..}`. When the body is not
/// valid JSON, `reason` holds the raw body text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {url}: {status} (request {error_code:?}) {detail}")]
pub struct ErrorResponse {
    pub status: u16,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub error_code: String,
    pub reason: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Errors returned while exchanging credentials for a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("auth: cannot encode credentials: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("auth: invalid login URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The login endpoint answered with a status outside 2xx.
    #[error("auth: cannot fetch token: {status}\nResponse: {body}")]
    Retrieve { status: u16, body: String },

    #[error("auth: cannot decode token: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("server response missing access_token")]
    MissingAccessToken,

    /// The token source handed out an empty or expiring token.
    #[error("auth: token is empty or expired")]
    InvalidToken,
}

/// Fails with `ApiError::Argument` when a required identifier is empty.
pub(crate) fn require(name: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Argument {
            name,
            reason: "must be set",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_error_names_the_parameter() {
        let err = require("groupId", "").unwrap_err();
        assert!(matches!(err, ApiError::Argument { name: "groupId", .. }));
        assert_eq!(err.to_string(), "groupId is invalid because must be set");
        assert!(require("groupId", "g1").is_ok());
    }

    #[test]
    fn error_response_display_includes_request_and_code() {
        let err = ErrorResponse {
            status: 404,
            method: HttpMethod::Get,
            url: "https://realm.mongodb.com/api/admin/v3.0/groups/g1/apps".to_string(),
            headers: Vec::new(),
            error_code: "GroupNotFound".to_string(),
            reason: "Not Found".to_string(),
            detail: "group not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GET https://realm.mongodb.com/api/admin/v3.0/groups/g1/apps: 404 (request \"GroupNotFound\") group not found"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn response_accessor_only_matches_status_errors() {
        let err = ApiError::Context(ContextError::Canceled);
        assert!(err.response().is_none());
        assert_eq!(err.to_string(), "context canceled");
    }

    #[test]
    fn retrieve_error_carries_status_and_body() {
        let err = AuthError::Retrieve {
            status: 401,
            body: "{\"error\":\"invalid username/password\"}".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid username/password"));
    }
}
