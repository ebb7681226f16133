//! Request chain demo: `/first` calls `/second` on the remote service with the
//! tracking GUID forwarded. Both services run in this process.

use std::sync::Arc;
use std::time::Duration;

use tether::config::TetherConfig;
use tether::logging::init_tracing;
use tether::runtime::prelude::HttpOutbound;
use tether::server::chain::{first_service, second_service, RemoteProcessor};
use tether::server::serve;
use tether::server::tracker::{GuidPropagator, TrackerLogger};

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = match TetherConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration failed");
            std::process::exit(2);
        }
    };
    let chain = config.chain;

    let outbound = match HttpOutbound::new(Duration::from_millis(chain.request_timeout_ms)) {
        Ok(outbound) => outbound,
        Err(err) => {
            tracing::error!(error = %err, "http client setup failed");
            std::process::exit(2);
        }
    };

    // Wiring is the only place that knows the GUID travels with logger and decorator.
    let processor = RemoteProcessor::new(
        Arc::new(GuidPropagator),
        Arc::new(TrackerLogger),
        Arc::new(outbound),
        chain.remote.clone(),
    );

    let first = serve(&chain.first_bind, first_service(Arc::new(processor)));
    let second = serve(&chain.second_bind, second_service(Arc::new(TrackerLogger)));
    if let Err(err) = tokio::try_join!(first, second) {
        tracing::error!(error = %err, "request chain stopped");
        std::process::exit(1);
    }
}
