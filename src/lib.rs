//! Tether
//!
//! Request-scoped context propagation and cooperative cancellation.
//!
//! - [`runtime`]: cause-preserving cancellation token and the fan-in worker
//!   coordinator built on it
//! - [`server`]: axum middleware filling an explicit request scope (identity,
//!   tracking GUID, log level, deadline) and the demo services using it
//! - [`exercise`]: the randomized termination race
//! - [`config`] and [`logging`]: ambient setup shared by the binaries

pub mod config;
pub mod exercise;
pub mod logging;
pub mod runtime;
pub mod server;
