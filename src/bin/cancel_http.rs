//! Two polling workers sharing one cancellation token; the first failure
//! stops the run and is reported as the cause.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tether::config::TetherConfig;
use tether::logging::init_tracing;
use tether::runtime::prelude::{Coordinator, EventSink, HttpOutbound, LineEventSink, Outbound};

#[tokio::main]
async fn main() {
    init_tracing("warn");

    let config = match TetherConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration failed");
            std::process::exit(2);
        }
    };

    let settings = &config.coordinator;
    let sink: Arc<dyn EventSink> = Arc::new(LineEventSink::new(io::stdout()));
    let built = HttpOutbound::new(Duration::from_millis(settings.request_timeout_ms))
        .and_then(|outbound| {
            let outbound: Arc<dyn Outbound> = Arc::new(outbound);
            Coordinator::from_settings(settings, outbound, sink)
        });

    let coordinator = match built {
        Ok(coordinator) => coordinator,
        Err(err) => {
            tracing::error!(error = %err, "coordinator setup failed");
            std::process::exit(2);
        }
    };

    let report = coordinator.run().await;
    tracing::debug!(received = report.received.len(), "run complete");
}
