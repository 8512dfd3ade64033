//! Request construction and execution for the administration API.
//!
//! # Design
//! `Client` holds the base URL, user agent and a shared `Transport`; it
//! carries no per-call state, so one instance can serve many threads. Each
//! call is split in two steps: `new_request*` builds an `HttpRequest` from a
//! relative path, and `execute*` runs it, checks the status and decodes the
//! body. Resource services (`apps()`, `event_triggers()`) are thin wrappers
//! over these two steps.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::apps::AppsService;
use crate::context::Context;
use crate::error::{ApiError, ErrorResponse};
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::triggers::EventTriggersService;

/// Public cloud root.
pub const URL: &str = "https://realm.mongodb.com/";
/// Path of the v3 administration API, relative to `URL`.
pub const API_ADMIN_V3_PATH: &str = "api/admin/v3.0/";
pub const DEFAULT_BASE_URL: &str = "https://realm.mongodb.com/api/admin/v3.0/";
pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const USER_AGENT: &str = "appservices-rs";

/// Invoked after every completed exchange, before the status is checked.
pub type RequestCompletionCallback = Box<dyn Fn(&HttpRequest, &HttpResponse) + Send + Sync>;

/// Metadata of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// The body as received, when raw capture is enabled.
    pub raw: Option<Vec<u8>>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Builder for configuring a [`Client`].
pub struct ClientBuilder {
    base_url: String,
    user_agent: String,
    with_raw: bool,
    transport: Option<Arc<dyn Transport>>,
    on_request_completed: Option<RequestCompletionCallback>,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            with_raw: false,
            transport: None,
            on_request_completed: None,
        }
    }

    /// Overrides the API root. Relative paths are resolved against it, so it
    /// must end with a slash for requests to be built.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Prefixes the default user agent: `"{user_agent} appservices-rs"`.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = format!("{user_agent} {}", self.user_agent);
        self
    }

    /// Keeps a copy of every response body in [`Response::raw`].
    pub fn with_raw(mut self) -> Self {
        self.with_raw = true;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn on_request_completed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HttpRequest, &HttpResponse) + Send + Sync + 'static,
    {
        self.on_request_completed = Some(Box::new(callback));
        self
    }

    /// ## Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<Client, ApiError> {
        let base_url = Url::parse(&self.base_url)?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new()));

        Ok(Client {
            transport,
            raw_base_url: self.base_url,
            base_url,
            user_agent: self.user_agent,
            with_raw: self.with_raw,
            on_request_completed: self.on_request_completed,
        })
    }
}

/// Blocking client for the App Services administration API.
pub struct Client {
    transport: Arc<dyn Transport>,
    /// As configured; parsing normalizes a host-only URL to path `/`.
    raw_base_url: String,
    base_url: Url,
    user_agent: String,
    with_raw: bool,
    on_request_completed: Option<RequestCompletionCallback>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("with_raw", &self.with_raw)
            .field("on_request_completed", &self.on_request_completed.is_some())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// A client for the public cloud over the default transport.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn apps(&self) -> AppsService<'_> {
        AppsService::new(self)
    }

    pub fn event_triggers(&self) -> EventTriggersService<'_> {
        EventTriggersService::new(self)
    }

    /// Builds a body-less request for `path`, relative to the base URL.
    ///
    /// Relative paths should not start with a slash; a leading slash
    /// replaces the base URL's path.
    pub fn new_request(&self, method: HttpMethod, path: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(method, path, None)
    }

    /// Builds a request whose body is `body` encoded as JSON.
    pub fn new_request_with_body<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut encoded = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        encoded.push('\n');
        self.build_request(method, path, Some(encoded))
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        if !has_trailing_slash(&self.raw_base_url) {
            return Err(ApiError::BaseUrl(self.raw_base_url.clone()));
        }
        let url = self.base_url.join(path)?;

        let mut headers = Vec::with_capacity(3);
        if body.is_some() {
            headers.push(("Content-Type".to_string(), JSON_MEDIA_TYPE.to_string()));
        }
        headers.push(("Accept".to_string(), JSON_MEDIA_TYPE.to_string()));
        if !self.user_agent.is_empty() {
            headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        }

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Runs `request` and decodes the body as JSON.
    ///
    /// An empty body yields `None`. Only the first JSON value is read.
    pub fn execute_json<T>(
        &self,
        ctx: &Context,
        request: HttpRequest,
    ) -> Result<(Option<T>, Response), ApiError>
    where
        T: DeserializeOwned,
    {
        let (body, response) = self.round_trip(ctx, request)?;
        let value = decode_json(&body)?;
        Ok((value, response))
    }

    /// Runs `request` and copies the body verbatim into `sink`.
    pub fn execute_raw<W>(
        &self,
        ctx: &Context,
        request: HttpRequest,
        sink: &mut W,
    ) -> Result<Response, ApiError>
    where
        W: Write + ?Sized,
    {
        let (body, response) = self.round_trip(ctx, request)?;
        sink.write_all(&body)?;
        Ok(response)
    }

    /// Runs `request` and discards the body.
    pub fn execute(&self, ctx: &Context, request: HttpRequest) -> Result<Response, ApiError> {
        let (_, response) = self.round_trip(ctx, request)?;
        Ok(response)
    }

    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    fn round_trip(&self, ctx: &Context, request: HttpRequest) -> Result<(Vec<u8>, Response), ApiError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let method = request.method;
        let url = request.url.clone();
        let sent = self.on_request_completed.as_ref().map(|_| request.clone());

        let http_response = match self.transport.execute(ctx, request) {
            Ok(response) => response,
            Err(err) => {
                // The context's error explains a transport failure better.
                if let Some(ctx_err) = ctx.err() {
                    return Err(ctx_err.into());
                }
                return Err(err.into());
            }
        };
        tracing::debug!(status = http_response.status, "request completed");

        if let (Some(callback), Some(sent)) = (&self.on_request_completed, &sent) {
            callback(sent, &http_response);
        }

        check_response(method, &url, &http_response)?;

        let HttpResponse {
            status,
            headers,
            body,
        } = http_response;
        let response = Response {
            status,
            headers,
            raw: self.with_raw.then(|| body.clone()),
        };
        Ok((body, response))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    reason: String,
    #[serde(default, rename = "error")]
    detail: String,
}

/// Maps a status outside 2xx to an [`ErrorResponse`].
///
/// A JSON body fills `error_code`, `reason` and `detail`. Any other
/// non-empty body is kept as `reason`.
pub fn check_response(method: HttpMethod, url: &str, response: &HttpResponse) -> Result<(), ErrorResponse> {
    if response.is_success() {
        return Ok(());
    }

    let mut error = ErrorResponse {
        status: response.status,
        method,
        url: url.to_string(),
        headers: response.headers.clone(),
        error_code: String::new(),
        reason: String::new(),
        detail: String::new(),
    };

    if !response.body.is_empty() {
        match serde_json::from_slice::<ErrorBody>(&response.body) {
            Ok(body) => {
                error.error_code = body.error_code;
                error.reason = body.reason;
                error.detail = body.detail;
            }
            Err(err) => {
                tracing::debug!(error = %err, "unmarshal error response");
                error.reason = String::from_utf8_lossy(&response.body).into_owned();
            }
        }
    }

    Err(error)
}

/// Decodes the first JSON value in `body`; `None` when the body holds only
/// whitespace or is `null`.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<Option<T>>()
        .next()
        .transpose()
        .map(Option::flatten)
        .map_err(ApiError::Deserialization)
}

/// Whether the path part of `url` (before any query or fragment) ends with
/// a slash. A host-only URL has an empty path and does not.
fn has_trailing_slash(url: &str) -> bool {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    let path = &url[..end];
    let path = match path.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => path,
    };
    path.ends_with('/')
}
