//! Polling worker: repeatedly calls one target and publishes each success.

use std::sync::Arc;
use std::time::Duration;

use crate::runtime::cancel::CancellationToken;
use crate::runtime::error::TetherError;
use crate::runtime::event::{emit_or_warn, Event, EventSink};
use crate::runtime::handoff::{Publish, Publisher};
use crate::runtime::outbound::{Outbound, OutboundRequest, OutboundResponse, StatusPolicy};

/// Static description of a worker.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub name: String,
    pub target: String,
    /// Pause after each published result.
    pub interval: Duration,
    pub fatal_statuses: StatusPolicy,
    /// Response header appended to the payload when present.
    pub echo_header: Option<String>,
}

impl WorkerConfig {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            interval: Duration::ZERO,
            fatal_statuses: StatusPolicy::default(),
            echo_header: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_fatal_statuses(mut self, policy: StatusPolicy) -> Self {
        self.fatal_statuses = policy;
        self
    }

    pub fn with_echo_header(mut self, header: impl Into<String>) -> Self {
        self.echo_header = Some(header.into());
        self
    }

    fn payload(&self, response: &OutboundResponse) -> String {
        let echoed = self
            .echo_header
            .as_deref()
            .map(|header| response.header(header).unwrap_or_default());
        match echoed {
            Some(value) => format!("success from {}: {}", self.name, value),
            None => format!("success from {}", self.name),
        }
    }
}

/// How a worker loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// This worker's failure became the run's cancellation cause.
    Failed(TetherError),
    /// Stopped after observing cancellation.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerExit {
    pub worker: String,
    /// Outbound calls issued, including the last one.
    pub iterations: u64,
    pub published: u64,
    pub outcome: WorkerOutcome,
}

pub struct Worker {
    config: WorkerConfig,
    outbound: Arc<dyn Outbound>,
    sink: Arc<dyn EventSink>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        outbound: Arc<dyn Outbound>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            outbound,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run until this worker fails or observes cancellation.
    pub async fn run(self, token: CancellationToken, publisher: Publisher<String>) -> WorkerExit {
        let request = OutboundRequest::get(&self.config.target);
        let mut iterations = 0u64;
        let mut published = 0u64;

        emit_or_warn(
            self.sink.as_ref(),
            Event::WorkerStarted {
                worker: self.config.name.clone(),
                target: self.config.target.clone(),
            },
        );

        let outcome = loop {
            if token.is_cancelled() {
                break WorkerOutcome::Cancelled;
            }

            iterations += 1;
            let response = match self.outbound.fetch(&request, &token).await {
                Ok(response) => response,
                // Only the shared token ends a worker quietly; a call that timed
                // out on its own is a failure.
                Err(err) if err.is_cancellation() && token.is_cancelled() => {
                    break WorkerOutcome::Cancelled
                }
                Err(err) => {
                    let cause = match err {
                        TetherError::Transport { message, .. } => {
                            TetherError::transport(&self.config.name, message)
                        }
                        other => TetherError::transport(&self.config.name, other.to_string()),
                    };
                    break self.fail(&token, cause);
                }
            };

            if self.config.fatal_statuses.is_fatal(response.status) {
                let cause = TetherError::Application {
                    origin: self.config.name.clone(),
                    status: response.status,
                };
                break self.fail(&token, cause);
            }

            let payload = self.config.payload(&response);
            match publisher.publish(payload.clone(), &token).await {
                Publish::Delivered => {
                    published += 1;
                    emit_or_warn(
                        self.sink.as_ref(),
                        Event::ResultPublished {
                            worker: self.config.name.clone(),
                            payload,
                        },
                    );
                }
                Publish::Dropped => break WorkerOutcome::Cancelled,
            }

            if !self.config.interval.is_zero() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break WorkerOutcome::Cancelled,
                    _ = tokio::time::sleep(self.config.interval) => {}
                }
            }
        };

        let error = match &outcome {
            WorkerOutcome::Failed(cause) => Some(cause.to_string()),
            WorkerOutcome::Cancelled => None,
        };
        emit_or_warn(
            self.sink.as_ref(),
            Event::WorkerStopped {
                worker: self.config.name.clone(),
                iterations,
                error,
            },
        );

        WorkerExit {
            worker: self.config.name,
            iterations,
            published,
            outcome,
        }
    }

    /// Record `cause` unless another holder cancelled first.
    fn fail(&self, token: &CancellationToken, cause: TetherError) -> WorkerOutcome {
        if token.cancel(cause.clone()) {
            WorkerOutcome::Failed(cause)
        } else {
            tracing::debug!(worker = %self.config.name, "failure after cancellation ignored");
            WorkerOutcome::Cancelled
        }
    }
}
