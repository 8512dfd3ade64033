//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::Client;
use crate::context::Context;
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

/// Replays queued responses in order and records every request it receives.
/// With nothing queued it answers `200` with an empty body.
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl StubTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::default()
    }

    pub(crate) fn respond(status: u16, body: &str) -> Arc<Self> {
        let stub = Self::new();
        stub.push_response(status, body);
        stub
    }

    pub(crate) fn push_response(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
    }

    /// Sleeps before answering, to let a context deadline pass.
    pub(crate) fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, _ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = *self.delay.lock().unwrap() {
            std::thread::sleep(delay);
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::new(message)),
            None => Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Vec::new(),
            }),
        }
    }
}

pub(crate) fn client_with(stub: &Arc<StubTransport>) -> Client {
    Client::builder()
        .transport(Arc::clone(stub))
        .build()
        .unwrap()
}
