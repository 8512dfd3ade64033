use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::AuthError;
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};

use super::token::TokenSource;

/// A `Transport` decorator that authorizes every request with the current
/// token from its source. Requests are refused, unsent, while the token is
/// empty or within ten seconds of its expiry.
pub struct AuthTransport<S> {
    base: Arc<dyn Transport>,
    source: S,
}

impl<S: TokenSource> AuthTransport<S> {
    pub fn new(base: impl Transport + 'static, source: S) -> Self {
        Self {
            base: Arc::new(base),
            source,
        }
    }
}

impl<S> fmt::Debug for AuthTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTransport").finish_non_exhaustive()
    }
}

impl<S: TokenSource> Transport for AuthTransport<S> {
    fn execute(&self, ctx: &Context, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let token = self.source.token().map_err(TransportError::new)?;
        if !token.is_valid() {
            return Err(TransportError::new(AuthError::InvalidToken));
        }
        token.set_auth_header(&mut request);
        self.base.execute(ctx, request)
    }
}

/// An authorizing transport over the default `ureq` transport.
pub fn authenticated<S: TokenSource>(source: S) -> AuthTransport<S> {
    AuthTransport::new(UreqTransport::new(), source)
}
