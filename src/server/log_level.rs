//! Per-request log level, chosen by the caller with `?log_level=`.

use std::collections::HashMap;

use axum::extract::{Query, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::server::scope::{Level, RequestScope};

pub const LOG_LEVEL_PARAM: &str = "log_level";

/// Copies a valid `log_level` query parameter into the request scope.
pub async fn middleware(mut request: Request, next: Next) -> Response {
    let param = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(LOG_LEVEL_PARAM))
        .unwrap_or_default();

    match param.parse::<Level>() {
        Ok(level) => RequestScope::update(&mut request, |scope| scope.log_level = Some(level)),
        Err(err) => tracing::warn!(param = %param, "{err}"),
    }
    next.run(request).await
}

/// Emit `message` if the request's level admits `level`. Returns whether it
/// was emitted.
pub fn log(scope: &RequestScope, level: Level, message: &str) -> bool {
    let Some(requested) = scope.log_level else {
        tracing::warn!("no log level available");
        return false;
    };

    let admitted = match level {
        Level::Debug => requested == Level::Debug,
        Level::Info => matches!(requested, Level::Debug | Level::Info),
    };
    if admitted {
        tracing::info!(level = %level, guid = scope.guid.as_deref().unwrap_or("-"), "{message}");
    }
    admitted
}
