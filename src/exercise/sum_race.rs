//! Randomized termination race: add random numbers until a target value is
//! drawn or a deadline cancels the loop.

use std::fmt;
use std::time::Duration;

use rand::Rng;

use crate::config::SumRaceSettings;
use crate::runtime::cancel::CancellationToken;
use crate::runtime::error::{TetherError, TetherResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    TargetReached,
    Timeout,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => f.write_str("number reached"),
            Self::Timeout => f.write_str("timeout"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SumReport {
    pub termination: Termination,
    pub iterations: u64,
    pub sum: u64,
}

/// Sum values from `next` until it yields `target` or `token` is cancelled.
///
/// The running value starts at zero, so the first pass adds nothing; a drawn
/// `target` ends the loop before it is added.
pub fn sum_until(
    mut next: impl FnMut() -> u64,
    target: u64,
    token: &CancellationToken,
) -> SumReport {
    let mut iterations = 0u64;
    let mut sum = 0u64;
    let mut value = 0u64;
    let mut termination = Termination::TargetReached;

    while value != target {
        sum = sum.saturating_add(value);
        if token.is_cancelled() {
            termination = Termination::Timeout;
            break;
        }
        iterations += 1;
        value = next();
    }

    SumReport {
        termination,
        iterations,
        sum,
    }
}

/// Run the race against a wall-clock deadline with values drawn from `[0, upper)`.
///
/// A target outside the range can never be drawn, so such a race always ends
/// in `Timeout`.
pub async fn run_sum_race(settings: &SumRaceSettings) -> TetherResult<SumReport> {
    if settings.upper == 0 {
        return Err(TetherError::config("sum race upper bound must be positive"));
    }

    let token = CancellationToken::new();
    let deadline = Duration::from_millis(settings.deadline_ms);
    let timer = {
        let token = token.clone();
        let after_ms = settings.deadline_ms;
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            token.cancel(TetherError::DeadlineExceeded { after_ms });
        })
    };

    let target = settings.target;
    let upper = settings.upper;
    let worker_token = token.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        sum_until(|| rng.gen_range(0..upper), target, &worker_token)
    })
    .await
    .map_err(|err| TetherError::Logic {
        message: format!("sum race task failed: {}", err),
    })?;

    timer.abort();
    token.cancel_with_reason("sum race finished");
    tracing::info!(
        termination = %report.termination,
        iterations = report.iterations,
        sum = report.sum,
        "sum race finished"
    );
    Ok(report)
}
