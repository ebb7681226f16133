//! Request tracking along a chain of services.
//!
//! A GUID is taken from the incoming `X-GUID` header (or generated), stored in
//! the request scope, written into every log line and forwarded on every
//! outbound call. Business logic only sees the [`ScopedLogger`] and
//! [`RequestDecorator`] traits and never touches the GUID itself.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::runtime::outbound::OutboundRequest;
use crate::server::scope::RequestScope;

pub const GUID_HEADER: &str = "X-GUID";

/// Stores the caller's GUID, or a fresh one, in the request scope.
pub async fn middleware(mut request: Request, next: Next) -> Response {
    let guid = request
        .headers()
        .get(GUID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let span = tracing::info_span!("request", guid = %guid);
    RequestScope::update(&mut request, |scope| scope.guid = Some(guid));
    next.run(request).instrument(span).await
}

/// Logging that can see request-scoped metadata.
pub trait ScopedLogger: Send + Sync {
    fn log(&self, scope: &RequestScope, message: &str);
}

/// Prefixes each message with the request GUID when one is known.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrackerLogger;

impl TrackerLogger {
    pub fn format(scope: &RequestScope, message: &str) -> String {
        match scope.guid.as_deref() {
            Some(guid) => format!("GUID: {guid} - {message}"),
            None => message.to_string(),
        }
    }
}

impl ScopedLogger for TrackerLogger {
    fn log(&self, scope: &RequestScope, message: &str) {
        tracing::info!(target: "tether::tracker", "{}", Self::format(scope, message));
    }
}

/// Adjusts outbound requests made on behalf of an incoming request.
pub trait RequestDecorator: Send + Sync {
    fn decorate(&self, scope: &RequestScope, request: OutboundRequest) -> OutboundRequest;
}

/// Forwards the request GUID as `X-GUID`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GuidPropagator;

impl RequestDecorator for GuidPropagator {
    fn decorate(&self, scope: &RequestScope, request: OutboundRequest) -> OutboundRequest {
        match scope.guid.as_deref() {
            Some(guid) => request.with_header(GUID_HEADER, guid),
            None => request,
        }
    }
}
