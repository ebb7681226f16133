use std::sync::{Arc, Mutex};

use tether::runtime::prelude::{Event, EventSink, TetherResult};

/// Capture run events for test assertions.
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::new(CollectorSink {
            events: Arc::clone(&self.events),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.events.lock().unwrap().iter().filter(|event| predicate(event)).count()
    }
}

struct CollectorSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventSink for CollectorSink {
    fn emit(&self, event: Event) -> TetherResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::WorkerStarted { .. } => "worker_started",
        Event::ResultPublished { .. } => "result_published",
        Event::ResultReceived { .. } => "result_received",
        Event::WorkerStopped { .. } => "worker_stopped",
        Event::CollectorCancelled { .. } => "collector_cancelled",
        Event::RunFinished { .. } => "run_finished",
    }
}

pub fn event_names(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(event_name).collect()
}
