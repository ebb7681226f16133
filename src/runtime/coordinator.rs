//! Coordinator: runs polling workers against one shared token and fans their
//! results into a single collector.
//!
//! Shutdown order is fixed: the collector exits on cancellation, then every
//! worker is joined, and only then is the final cause reported.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::config::CoordinatorSettings;
use crate::runtime::cancel::CancellationToken;
use crate::runtime::collector::Collector;
use crate::runtime::error::{TetherError, TetherResult};
use crate::runtime::event::{emit_or_warn, Event, EventSink};
use crate::runtime::handoff;
use crate::runtime::outbound::{Outbound, StatusPolicy};
use crate::runtime::worker::{Worker, WorkerConfig, WorkerExit};

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub received: Vec<String>,
    pub cause: Option<TetherError>,
    pub exits: Vec<WorkerExit>,
}

impl RunReport {
    pub fn exit(&self, worker: &str) -> Option<&WorkerExit> {
        self.exits.iter().find(|exit| exit.worker == worker)
    }
}

pub struct Coordinator {
    workers: Vec<WorkerConfig>,
    outbound: Arc<dyn Outbound>,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
}

impl Coordinator {
    pub fn new(outbound: Arc<dyn Outbound>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            workers: Vec::new(),
            outbound,
            sink,
            token: CancellationToken::new(),
        }
    }

    pub fn from_settings(
        settings: &CoordinatorSettings,
        outbound: Arc<dyn Outbound>,
        sink: Arc<dyn EventSink>,
    ) -> TetherResult<Self> {
        if settings.workers.is_empty() {
            return Err(TetherError::config("coordinator needs at least one worker"));
        }
        let mut coordinator = Self::new(outbound, sink);
        for worker in &settings.workers {
            if worker.target.trim().is_empty() {
                return Err(TetherError::config(format!(
                    "worker {} has no target",
                    worker.name
                )));
            }
            let mut config = WorkerConfig::new(&worker.name, &worker.target)
                .with_interval(Duration::from_millis(worker.interval_ms))
                .with_fatal_statuses(StatusPolicy::fatal_on(&worker.fatal_statuses));
            if let Some(header) = &worker.echo_header {
                config = config.with_echo_header(header);
            }
            coordinator = coordinator.with_worker(config);
        }
        Ok(coordinator)
    }

    pub fn with_worker(mut self, config: WorkerConfig) -> Self {
        self.workers.push(config);
        self
    }

    /// Use a token owned elsewhere, e.g. by a caller imposing a time bound.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn run(self) -> RunReport {
        let Self {
            workers,
            outbound,
            sink,
            token,
        } = self;

        let (publisher, mut receiver) = handoff::channel();
        let mut running = JoinSet::new();
        for config in workers {
            let worker = Worker::new(config, Arc::clone(&outbound), Arc::clone(&sink));
            tracing::debug!(worker = worker.name(), "spawning worker");
            running.spawn(worker.run(token.clone(), publisher.clone()));
        }
        drop(publisher);

        let collected = Collector::new(Arc::clone(&sink))
            .run(&mut receiver, &token)
            .await;

        let mut exits = Vec::new();
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(exit) => exits.push(exit),
                Err(err) => tracing::error!(error = %err, "worker task panicked"),
            }
        }

        let cause = token.cause();
        if cause != collected.cause {
            tracing::warn!("cause changed between collector exit and shutdown");
        }
        emit_or_warn(
            sink.as_ref(),
            Event::RunFinished {
                cause: Event::cause_text(cause.as_ref()),
            },
        );
        token.cancel_with_reason("run finished");

        RunReport {
            received: collected.received,
            cause,
            exits,
        }
    }
}
