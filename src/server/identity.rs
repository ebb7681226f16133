//! Cookie-based identity.
//!
//! The cookie is an unsigned placeholder: any client can claim any identity.

use axum::extract::Request;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::runtime::error::{TetherError, TetherResult};
use crate::server::scope::RequestScope;

pub const IDENTITY_COOKIE: &str = "identity";

/// Read the identity cookie from request headers.
pub fn extract_user(headers: &HeaderMap) -> TetherResult<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == IDENTITY_COOKIE)
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| TetherError::Unauthorized {
            reason: format!("missing {IDENTITY_COOKIE} cookie"),
        })
}

/// Loads the caller's identity into the request scope, or answers 401.
pub async fn middleware(mut request: Request, next: Next) -> Response {
    let user = match extract_user(request.headers()) {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(error = %err, "rejecting anonymous request");
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    };

    RequestScope::update(&mut request, |scope| scope.user = Some(user));
    next.run(request).await
}

pub fn set_user_cookie(user: &str) -> TetherResult<HeaderValue> {
    HeaderValue::from_str(&format!("{IDENTITY_COOKIE}={user}"))
        .map_err(|err| TetherError::Logic {
            message: format!("invalid identity value: {}", err),
        })
}

pub fn delete_user_cookie() -> HeaderValue {
    HeaderValue::from_static("identity=; Path=/; Max-Age=0")
}

pub(crate) fn with_cookie(mut response: Response, cookie: HeaderValue) -> Response {
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}
