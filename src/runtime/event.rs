//! Event protocol for coordinator runs.
//!
//! Workers, the collector and the coordinator report through a single
//! `EventSink`, so the same run can be printed, logged or captured in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::runtime::error::{TetherError, TetherResult};

/// Runtime events emitted during a coordinator run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    WorkerStarted {
        worker: String,
        target: String,
    },
    ResultPublished {
        worker: String,
        payload: String,
    },
    ResultReceived {
        payload: String,
    },
    WorkerStopped {
        worker: String,
        iterations: u64,
        /// Present when this worker's failure cancelled the run.
        error: Option<String>,
    },
    CollectorCancelled {
        cause: Option<String>,
    },
    RunFinished {
        cause: Option<String>,
    },
}

impl Event {
    pub(crate) fn cause_text(cause: Option<&TetherError>) -> Option<String> {
        cause.map(ToString::to_string)
    }
}

/// Metadata attached to a sequenced event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub seq: u64,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub meta: EventMeta,
    pub event: Event,
}

/// Assigns monotonically increasing sequence numbers to events.
#[derive(Debug, Default)]
pub struct EventSequencer {
    next: AtomicU64,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: Event) -> EventRecord {
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        EventRecord {
            meta: EventMeta {
                seq,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            event,
        }
    }
}

/// Event sink for reporting run progress.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event) -> TetherResult<()>;
}

/// A no-op event sink for tests or silent execution.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: Event) -> TetherResult<()> {
        Ok(())
    }
}

/// Forwards events to `tracing` as structured log lines.
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) -> TetherResult<()> {
        match event {
            Event::WorkerStarted { worker, target } => {
                tracing::debug!(%worker, %target, "worker started");
            }
            Event::ResultPublished { worker, payload } => {
                tracing::debug!(%worker, %payload, "result published");
            }
            Event::ResultReceived { payload } => {
                tracing::info!(%payload, "result received");
            }
            Event::WorkerStopped {
                worker,
                iterations,
                error: Some(error),
            } => {
                tracing::warn!(%worker, iterations, %error, "worker failed");
            }
            Event::WorkerStopped {
                worker, iterations, ..
            } => {
                tracing::debug!(%worker, iterations, "worker stopped");
            }
            Event::CollectorCancelled { cause } => {
                tracing::info!(cause = cause.as_deref().unwrap_or("none"), "collector cancelled");
            }
            Event::RunFinished { cause } => {
                tracing::info!(cause = cause.as_deref().unwrap_or("none"), "run finished");
            }
        }
        Ok(())
    }
}

/// Emit and downgrade sink failures to a warning; reporting never stops a run.
pub(crate) fn emit_or_warn(sink: &dyn EventSink, event: Event) {
    if let Err(err) = sink.emit(event) {
        tracing::warn!(error = %err, "dropping event after sink failure");
    }
}
