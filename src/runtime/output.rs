//! Output adapters for run event streams.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::runtime::error::{TetherError, TetherResult};
use crate::runtime::event::{Event, EventSequencer, EventSink};

/// Human-readable lines, one per reportable event.
///
/// Only results and causes are printed; worker lifecycle events are left to
/// the tracing sink.
pub struct LineEventSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render_line(event: &Event) -> Option<String> {
    let cause_or_none =
        |cause: &Option<String>| cause.clone().unwrap_or_else(|| "<nil>".to_string());
    match event {
        Event::ResultReceived { payload } => Some(format!("in main: {payload}")),
        Event::CollectorCancelled { cause } => {
            Some(format!("in main: cancelled! {}", cause_or_none(cause)))
        }
        Event::RunFinished { cause } => Some(format!("context cause: {}", cause_or_none(cause))),
        // Failure text already names the worker.
        Event::WorkerStopped {
            error: Some(error), ..
        } => Some(error.clone()),
        _ => None,
    }
}

impl<W: Write + Send> EventSink for LineEventSink<W> {
    fn emit(&self, event: Event) -> TetherResult<()> {
        let Some(line) = render_line(&event) else {
            return Ok(());
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}").map_err(|err| TetherError::Sink {
            sink: "lines".to_string(),
            message: format!("write event failed: {}", err),
        })
    }
}

/// JSON Lines output with sequence metadata (machine-friendly).
pub struct JsonLineEventSink<W: Write + Send> {
    writer: Mutex<W>,
    sequencer: EventSequencer,
}

impl<W: Write + Send> JsonLineEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            sequencer: EventSequencer::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> std::fmt::Debug for JsonLineEventSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLineEventSink").finish()
    }
}

impl<W: Write + Send> EventSink for JsonLineEventSink<W> {
    fn emit(&self, event: Event) -> TetherResult<()> {
        let record = self.sequencer.record(event);
        let json = serde_json::to_string(&record).map_err(|err| TetherError::Sink {
            sink: "jsonl".to_string(),
            message: format!("serialize event failed: {}", err),
        })?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{json}").map_err(|err| TetherError::Sink {
            sink: "jsonl".to_string(),
            message: format!("write event failed: {}", err),
        })
    }
}
