//! Two-service request chain.
//!
//! The first service answers `/first` by calling `/second` on a remote
//! service. Tracking data flows through the injected logger and decorator;
//! the processor itself only handles `data`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::runtime::error::TetherResult;
use crate::runtime::outbound::{Outbound, OutboundRequest};
use crate::runtime::BoxFuture;
use crate::server::scope::RequestScope;
use crate::server::tracker::{self, RequestDecorator, ScopedLogger};

pub trait Processor: Send + Sync {
    fn process<'a>(
        &'a self,
        scope: &'a RequestScope,
        data: &'a str,
    ) -> BoxFuture<'a, TetherResult<String>>;
}

/// Forwards `data` to the remote `/second` endpoint and returns its body.
pub struct RemoteProcessor {
    decorator: Arc<dyn RequestDecorator>,
    logger: Arc<dyn ScopedLogger>,
    outbound: Arc<dyn Outbound>,
    remote: String,
}

impl RemoteProcessor {
    pub fn new(
        decorator: Arc<dyn RequestDecorator>,
        logger: Arc<dyn ScopedLogger>,
        outbound: Arc<dyn Outbound>,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            decorator,
            logger,
            outbound,
            remote: remote.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/second", self.remote.trim_end_matches('/'))
    }
}

impl Processor for RemoteProcessor {
    fn process<'a>(
        &'a self,
        scope: &'a RequestScope,
        data: &'a str,
    ) -> BoxFuture<'a, TetherResult<String>> {
        Box::pin(async move {
            self.logger.log(scope, &format!("starting Process with {data}"));

            let request = OutboundRequest::get(self.endpoint()).with_query("query", data);
            let request = self.decorator.decorate(scope, request);
            // Requests without a deadline run until the outbound timeout.
            let token = scope.deadline.clone().unwrap_or_default();

            match self.outbound.fetch(&request, &token).await {
                Ok(response) => {
                    if response.body.is_empty() {
                        self.logger.log(scope, "empty response from second");
                    }
                    Ok(response.body)
                }
                Err(err) => {
                    self.logger
                        .log(scope, &format!("error calling remote service: {err}"));
                    Err(err)
                }
            }
        })
    }
}

#[derive(Clone)]
struct FirstState {
    processor: Arc<dyn Processor>,
}

async fn first(
    State(state): State<FirstState>,
    scope: RequestScope,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let data = params.get("data").map(String::as_str).unwrap_or_default();
    match state.processor.process(&scope, data).await {
        Ok(result) => result.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// The calling service: `GET /first?data=`.
pub fn first_service(processor: Arc<dyn Processor>) -> Router {
    Router::new()
        .route("/first", get(first))
        .layer(middleware::from_fn(tracker::middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(FirstState { processor })
}

#[derive(Clone)]
struct SecondState {
    logger: Arc<dyn ScopedLogger>,
}

async fn second(
    State(state): State<SecondState>,
    scope: RequestScope,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let query = params.get("query").map(String::as_str).unwrap_or_default();
    state.logger.log(&scope, &format!("second received {query}"));
    format!("second received {query}")
}

/// The downstream service: `GET /second?query=`.
pub fn second_service(logger: Arc<dyn ScopedLogger>) -> Router {
    Router::new()
        .route("/second", get(second))
        .layer(middleware::from_fn(tracker::middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(SecondState { logger })
}
