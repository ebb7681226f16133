//! Structured logging setup.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

pub const LOG_FILTER_ENV: &str = "TETHER_LOG";

/// Install the global subscriber once.
///
/// The filter comes from `TETHER_LOG`, then `RUST_LOG`, then `default_directive`.
pub fn init_tracing(default_directive: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let directive = resolve_directive(
            std::env::var(LOG_FILTER_ENV).ok(),
            std::env::var("RUST_LOG").ok(),
            default_directive,
        );
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        // Another subscriber (e.g. a test harness) may already be installed.
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

fn resolve_directive(explicit: Option<String>, rust_log: Option<String>, fallback: &str) -> String {
    explicit
        .into_iter()
        .chain(rust_log)
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
