//! Fan-in collector: drains worker results until the run is cancelled.

use std::sync::Arc;

use crate::runtime::cancel::CancellationToken;
use crate::runtime::error::TetherError;
use crate::runtime::event::{emit_or_warn, Event, EventSink};
use crate::runtime::handoff::Receiver;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectorReport {
    pub received: Vec<String>,
    /// Cause observed when the loop exited.
    pub cause: Option<TetherError>,
}

pub struct Collector {
    sink: Arc<dyn EventSink>,
}

impl Collector {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub async fn run(
        &self,
        receiver: &mut Receiver<String>,
        token: &CancellationToken,
    ) -> CollectorReport {
        let mut report = CollectorReport::default();
        while let Some(payload) = receiver.next(token).await {
            emit_or_warn(
                self.sink.as_ref(),
                Event::ResultReceived {
                    payload: payload.clone(),
                },
            );
            report.received.push(payload);
        }

        report.cause = token.cause();
        if report.cause.is_none() {
            tracing::warn!("all workers exited without cancelling the run");
        }
        emit_or_warn(
            self.sink.as_ref(),
            Event::CollectorCancelled {
                cause: Event::cause_text(report.cause.as_ref()),
            },
        );
        report
    }
}
