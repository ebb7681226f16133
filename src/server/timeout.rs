//! Per-request deadlines.

use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::runtime::cancel::CancellationToken;
use crate::runtime::error::TetherError;
use crate::runtime::BoxFuture;
use crate::server::scope::RequestScope;

/// Bound the rest of the request by `timeout`.
///
/// A fresh deadline token goes into the scope so downstream calls can observe
/// it. When the deadline passes first, the token is cancelled with
/// `DeadlineExceeded` and the caller gets `408 Request Timeout`.
pub async fn middleware(timeout: Duration, mut request: Request, next: Next) -> Response {
    let token = CancellationToken::new();
    RequestScope::update(&mut request, |scope| scope.deadline = Some(token.clone()));

    let response = tokio::select! {
        response = next.run(request) => response,
        _ = tokio::time::sleep(timeout) => {
            let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            token.cancel(TetherError::DeadlineExceeded { after_ms });
            tracing::warn!(after_ms, "request deadline exceeded");
            return (StatusCode::REQUEST_TIMEOUT, "request timed out").into_response();
        }
    };
    token.cancel_with_reason("request finished");
    response
}

/// Middleware-generating function: `router.layer(axum::middleware::from_fn(timeout::layer(ms)))`.
pub fn layer(
    ms: u64,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    let timeout = Duration::from_millis(ms);
    move |request: Request, next: Next| -> BoxFuture<'static, Response> {
        Box::pin(middleware(timeout, request, next))
    }
}
