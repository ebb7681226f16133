//! User-management service: login, identity-protected business call, logout.
//!
//! The controller never sees cookies. It reads the user from the request
//! scope (filled by [`identity::middleware`]) and passes it explicitly to the
//! business logic.

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
use crate::runtime::BoxFuture;
use crate::server::identity;
use crate::server::scope::RequestScope;

/// Business logic behind the identity gate.
pub trait Logic: Send + Sync {
    fn business_logic<'a>(
        &'a self,
        scope: &'a RequestScope,
        user: &'a str,
        data: &'a str,
    ) -> BoxFuture<'a, TetherResult<String>>;
}

/// Placeholder logic that greets the caller.
pub struct Greeter;

impl Logic for Greeter {
    fn business_logic<'a>(
        &'a self,
        _scope: &'a RequestScope,
        user: &'a str,
        data: &'a str,
    ) -> BoxFuture<'a, TetherResult<String>> {
        Box::pin(async move { Ok(format!("Hello {user}, thank you for sending me {data}")) })
    }
}

#[derive(Clone)]
pub struct Controller {
    logic: Arc<dyn Logic>,
}

impl Controller {
    pub fn new(logic: Arc<dyn Logic>) -> Self {
        Self { logic }
    }
}

type Params = Query<HashMap<String, String>>;

async fn login(Query(params): Params) -> Response {
    let user = params.get("user").map(|user| user.trim()).unwrap_or_default();
    if user.is_empty() {
        return (StatusCode::BAD_REQUEST, "No user specified").into_response();
    }
    match identity::set_user_cookie(user) {
        Ok(cookie) => identity::with_cookie(
            (StatusCode::OK, "user logged in").into_response(),
            cookie,
        ),
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

async fn do_logic(
    State(controller): State<Controller>,
    scope: RequestScope,
    Query(params): Params,
) -> Response {
    let Some(user) = scope.user.as_deref() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let data = params.get("data").map(String::as_str).unwrap_or_default();

    match controller.logic.business_logic(&scope, user, data).await {
        Ok(result) => result.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn logout(scope: RequestScope) -> Response {
    if scope.user.is_none() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    identity::with_cookie(
        (StatusCode::OK, "user logged out").into_response(),
        identity::delete_user_cookie(),
    )
}

/// Routes: `/login`, and `/business`, `/business/logout` behind the identity gate.
pub fn router(controller: Controller) -> Router {
    let business = Router::new()
        .route("/business", get(do_logic))
        .route("/business/logout", get(logout))
        .route_layer(middleware::from_fn(identity::middleware));

    Router::new()
        .route("/login", get(login))
        .merge(business)
        .layer(TraceLayer::new_for_http())
        .with_state(controller)
}
