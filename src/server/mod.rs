//! HTTP surfaces: middleware that fills a [`RequestScope`] and the demo
//! services built on it.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::runtime::error::{TetherError, TetherResult};

pub mod chain;
pub mod identity;
pub mod log_level;
pub mod scope;
pub mod timeout;
pub mod tracker;
pub mod user;

pub use scope::{Level, RequestScope};

async fn log_handler(scope: RequestScope) -> &'static str {
    log_level::log(
        &scope,
        Level::Debug,
        "the log level is set and everything works properly",
    );
    ""
}

/// Exercise service: `GET /log` with per-request log level and deadline.
pub fn exercise_service(request_timeout_ms: u64) -> Router {
    Router::new()
        .route("/log", get(log_handler))
        .layer(middleware::from_fn(log_level::middleware))
        .layer(middleware::from_fn(timeout::layer(request_timeout_ms)))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `router` until the process exits.
pub async fn serve(addr: &str, router: Router) -> TetherResult<()> {
    let listener = TcpListener::bind(addr).await.map_err(|err| {
        TetherError::transport(format!("listener {addr}"), err.to_string())
    })?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, router)
        .await
        .map_err(|err| TetherError::transport(format!("server {addr}"), err.to_string()))
}
