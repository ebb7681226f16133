//! Cancellable outbound calls.
//!
//! `Outbound` is the seam between the coordinator and the network. The HTTP
//! implementation races the request against the token; cancellation drops the
//! in-flight request and its connection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::runtime::cancel::CancellationToken;
use crate::runtime::error::{TetherError, TetherResult};
use crate::runtime::BoxFuture;

/// A GET request to issue against a target address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundRequest {
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A completed outbound call. Any status, including 5xx, lands here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl OutboundResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Capability to make a network request bound to a cancellation token.
///
/// Implementations must resolve promptly with `TetherError::Cancelled` once the
/// token is cancelled.
pub trait Outbound: Send + Sync {
    fn fetch<'a>(
        &'a self,
        request: &'a OutboundRequest,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, TetherResult<OutboundResponse>>;
}

/// Decides which response statuses are fatal to a worker.
#[derive(Clone)]
pub struct StatusPolicy {
    predicate: Arc<dyn Fn(u16) -> bool + Send + Sync>,
}

impl StatusPolicy {
    pub fn from_fn(predicate: impl Fn(u16) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn fatal_on(statuses: &[u16]) -> Self {
        let statuses = statuses.to_vec();
        Self::from_fn(move |status| statuses.contains(&status))
    }

    pub fn server_errors() -> Self {
        Self::from_fn(|status| (500..600).contains(&status))
    }

    pub fn never() -> Self {
        Self::from_fn(|_| false)
    }

    pub fn is_fatal(&self, status: u16) -> bool {
        (self.predicate)(status)
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::fatal_on(&[500])
    }
}

impl fmt::Debug for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusPolicy").finish_non_exhaustive()
    }
}

/// reqwest-backed HTTP client.
#[derive(Clone, Debug)]
pub struct HttpOutbound {
    client: reqwest::Client,
}

impl HttpOutbound {
    pub fn new(timeout: Duration) -> TetherResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TetherError::config(format!("build http client failed: {}", err)))?;
        Ok(Self { client })
    }

    async fn send(&self, request: &OutboundRequest) -> TetherResult<OutboundResponse> {
        let mut builder = self.client.get(&request.target);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TetherError::transport(&request.target, err.to_string()))?;

        let mut out = OutboundResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                out = out.with_header(name.as_str(), value);
            }
        }
        let body = response.text().await.map_err(|err| {
            TetherError::transport(&request.target, format!("read body failed: {}", err))
        })?;
        Ok(out.with_body(body))
    }
}

impl Outbound for HttpOutbound {
    fn fetch<'a>(
        &'a self,
        request: &'a OutboundRequest,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, TetherResult<OutboundResponse>> {
        Box::pin(async move {
            token.check_cancelled()?;
            // Losing the race drops the request future, which closes its connection.
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(token.cancellation_error()),
                result = self.send(request) => result,
            }
        })
    }
}
