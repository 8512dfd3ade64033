//! Blocking client for the MongoDB App Services administration API.
//!
//! # Overview
//! Builds requests against the documented REST endpoints, executes them
//! through a pluggable transport, and decodes JSON payloads into typed
//! records. Every operation is one request/response exchange; there is no
//! retry, caching or pagination following.
//!
//! # Design
//! - `Client` is stateless apart from its configuration; each call is split
//!   into `new_request*` (produces an `HttpRequest`) and `execute*`
//!   (consumes an `HttpResponse`), with the `Transport` trait as the I/O
//!   boundary.
//! - `auth` exchanges API credentials for a bearer token and provides a
//!   transport decorator that attaches it.
//! - Resource services (`apps`, `triggers`) validate identifiers, format
//!   paths and delegate to the client.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod apps;
pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod query;
pub mod triggers;
pub mod types;

#[cfg(test)]
mod testing;

pub use apps::AppsService;
pub use client::{Client, ClientBuilder, Response};
pub use config::ClientConfig;
pub use context::{Context, ContextError};
pub use error::{ApiError, AuthError, ErrorResponse};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use query::{set_query_params, QueryOptions};
pub use triggers::EventTriggersService;
pub use types::{
    Application, ApplicationListOptions, EventTrigger, EventTriggerConfig, EventTriggerRequest,
    TriggerType,
};
