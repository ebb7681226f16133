//! Cookie identity demo: `/login?user=`, `/business?data=`, `/business/logout`.

use std::sync::Arc;

use tether::config::TetherConfig;
use tether::logging::init_tracing;
use tether::server::serve;
use tether::server::user::{router, Controller, Greeter};

#[tokio::main]
async fn main() {
    init_tracing("info,tower_http=debug");

    let result = match TetherConfig::load() {
        Ok(config) => {
            let app = router(Controller::new(Arc::new(Greeter)));
            serve(&config.user_service.bind, app).await
        }
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        tracing::error!(error = %err, "user management service stopped");
        std::process::exit(1);
    }
}
