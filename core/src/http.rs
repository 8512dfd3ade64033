//! HTTP transport types and the pluggable executor behind the client.
//!
//! # Design
//! Requests and responses are plain data. `Client` builds `HttpRequest`
//! values and interprets `HttpResponse` values; the `Transport` trait is the
//! only place that touches the network. The default `UreqTransport` uses a
//! blocking `ureq` agent, and decorators (such as `auth::AuthTransport`) wrap
//! another transport to adjust each outgoing request.
//!
//! All fields use owned types so requests can be cloned for completion
//! callbacks and handed across threads without lifetime concerns.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::context::Context;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `Client::new_request*`. `url` is absolute: the relative path has
/// already been resolved against the client's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Returns the first header value matching `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Replaces every header named `name` with a single `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// An HTTP response described as plain data.
///
/// The body has been read to completion by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A network-level failure: DNS, connect, TLS, redirect loop, timeout, or a
/// failure raised by a transport decorator.
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(err.into())
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

/// Executes one HTTP exchange.
///
/// Implementations must return non-2xx responses as `Ok`; status
/// interpretation belongs to the client. The body must be fully read before
/// returning.
pub trait Transport: Send + Sync {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(ctx, request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(ctx, request)
    }
}

/// Blocking transport backed by a shared `ureq` agent.
///
/// The agent keeps a keep-alive pool and follows redirects. Each exchange
/// runs under [`Context::run`], so canceling the context releases the
/// caller at once; the context's remaining time, if any, also becomes the
/// request's global timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let timeout = ctx.remaining();
        ctx.run(move || exchange(&agent, request, timeout))
            .map_err(TransportError::new)?
    }
}

fn exchange(
    agent: &ureq::Agent,
    request: HttpRequest,
    timeout: Option<Duration>,
) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let result = match (method, body) {
        (HttpMethod::Get, _) => prepare(agent.get(&url), &headers, timeout).call(),
        (HttpMethod::Delete, _) => prepare(agent.delete(&url), &headers, timeout).call(),
        (HttpMethod::Post, Some(body)) => {
            prepare(agent.post(&url), &headers, timeout).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => prepare(agent.post(&url), &headers, timeout).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            prepare(agent.put(&url), &headers, timeout).send(body.as_bytes())
        }
        (HttpMethod::Put, None) => prepare(agent.put(&url), &headers, timeout).send_empty(),
    };

    let mut response = result.map_err(TransportError::new)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_vec().map_err(TransportError::new)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Vec::new(),
        };
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("accept"), None);
    }

    #[test]
    fn set_header_replaces_existing_values() {
        let mut request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/".to_string(),
            headers: vec![
                ("authorization".to_string(), "Bearer old".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            body: None,
        };
        request.set_header("Authorization", "Bearer new");
        assert_eq!(request.header("authorization"), Some("Bearer new"));
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn success_range_is_2xx() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 302;
        assert!(!response.is_success());
        response.status = 199;
        assert!(!response.is_success());
    }

    #[test]
    fn method_display_matches_wire_name() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
    }

    #[test]
    fn cancel_releases_a_request_the_server_never_answers() {
        // Connections queue in the backlog and are never read.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let ctx = Context::background();
        let canceler = ctx.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            canceler.cancel();
        });

        let started = std::time::Instant::now();
        let err = UreqTransport::new()
            .execute(
                &ctx,
                HttpRequest {
                    method: HttpMethod::Get,
                    url: format!("http://{addr}/"),
                    headers: Vec::new(),
                    body: None,
                },
            )
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(err.to_string().contains("context canceled"));
        drop(listener);
    }
}
