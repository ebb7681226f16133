//! Request-scoped metadata.
//!
//! Each middleware fills one named field; handlers take the whole scope as an
//! extractor and pass it on explicitly to whatever needs it.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;

use crate::runtime::cancel::CancellationToken;

/// Log level requested by the caller of a single request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Debug,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!("invalid log level: {other:?}")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestScope {
    /// Tracking id shared by every service a request passes through.
    pub guid: Option<String>,
    /// Identity loaded from the request cookie.
    pub user: Option<String>,
    pub log_level: Option<Level>,
    /// Cancelled when the request deadline passes.
    pub deadline: Option<CancellationToken>,
}

impl RequestScope {
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Modify the scope stored on `request`, creating it if absent.
    pub fn update(request: &mut Request, apply: impl FnOnce(&mut RequestScope)) {
        let mut scope = request
            .extensions_mut()
            .remove::<RequestScope>()
            .unwrap_or_default();
        apply(&mut scope);
        request.extensions_mut().insert(scope);
    }

    pub fn of(request: &Request) -> RequestScope {
        request
            .extensions()
            .get::<RequestScope>()
            .cloned()
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestScope>()
            .cloned()
            .unwrap_or_default())
    }
}
