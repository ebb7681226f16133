//! Exercise runner: the sum race, then the `/log` service.

use tether::config::TetherConfig;
use tether::exercise::sum_race::run_sum_race;
use tether::logging::init_tracing;
use tether::server::{exercise_service, serve};

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
    let exercises = config.exercises;

    match run_sum_race(&exercises.sum_race).await {
        Ok(report) => {
            println!("termination cause: {}", report.termination);
            println!("number of iterations: {}", report.iterations);
            println!("sum: {}\n", report.sum);
        }
        Err(err) => tracing::error!(error = %err, "sum race failed"),
    }

    let app = exercise_service(exercises.request_timeout_ms);
    if let Err(err) = serve(&exercises.bind, app).await {
        tracing::error!(error = %err, "exercise service stopped");
        std::process::exit(1);
    }
}
