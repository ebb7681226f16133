//! Tether runtime
//!
//! Cooperative cancellation and fan-in coordination for polling workers.
//!
//! ## Pieces
//!
//! - **CancellationToken**: one-shot, cause-preserving cancellation
//! - **Worker**: polls one outbound target, publishes successes
//! - **Collector**: drains results until cancellation
//! - **Coordinator**: wires the above together and reports the final cause
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tether::runtime::prelude::*;
//!
//! # async fn run() -> TetherResult<()> {
//! let outbound: Arc<dyn Outbound> = Arc::new(HttpOutbound::new(Duration::from_secs(30))?);
//! let sink: Arc<dyn EventSink> = Arc::new(TracingEventSink);
//! let report = Coordinator::new(outbound, sink)
//!     .with_worker(
//!         WorkerConfig::new("status", "http://httpbin.org/status/200,200,200,500")
//!             .with_interval(Duration::from_secs(1)),
//!     )
//!     .with_worker(
//!         WorkerConfig::new("delay", "http://httpbin.org/delay/1").with_echo_header("date"),
//!     )
//!     .run()
//!     .await;
//! println!("context cause: {:?}", report.cause);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod cancel;
pub mod collector;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod handoff;
pub mod outbound;
pub mod output;
pub mod worker;

/// Boxed, sendable future returned by the object-safe traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::runtime::cancel::CancellationToken;
    pub use crate::runtime::collector::{Collector, CollectorReport};
    pub use crate::runtime::coordinator::{Coordinator, RunReport};
    pub use crate::runtime::error::{TetherError, TetherResult};
    pub use crate::runtime::event::{Event, EventSink, NoopEventSink, TracingEventSink};
    pub use crate::runtime::handoff::Publish;
    pub use crate::runtime::outbound::{
        HttpOutbound,
        Outbound,
        OutboundRequest,
        OutboundResponse,
        StatusPolicy,
    };
    pub use crate::runtime::output::{JsonLineEventSink, LineEventSink};
    pub use crate::runtime::worker::{Worker, WorkerConfig, WorkerExit, WorkerOutcome};
    pub use crate::runtime::BoxFuture;
}
