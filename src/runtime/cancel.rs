//! Cancellation primitives for runtime execution.
//!
//! The token carries a single cause: whichever `cancel` call takes the cause
//! lock first records it, and every later call is a no-op. The flag is only
//! raised after the cause is stored, so an observer that sees
//! `is_cancelled() == true` always finds a cause.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::runtime::error::{TetherError, TetherResult};

/// Cooperative, cause-preserving cancellation token.
///
/// Clones share state; any holder may cancel.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    cause: Mutex<Option<TetherError>>,
    signal: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with `cause`. Returns `true` only for the call that recorded it.
    pub fn cancel(&self, cause: impl Into<TetherError>) -> bool {
        let mut guard = self
            .inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return false;
        }
        let cause = cause.into();
        tracing::debug!(cause = %cause, "cancellation token cancelled");
        *guard = Some(cause);
        self.inner.cancelled.store(true, Ordering::SeqCst);
        drop(guard);
        self.inner.signal.cancel();
        true
    }

    pub fn cancel_with_reason(&self, reason: impl Into<String>) -> bool {
        self.cancel(TetherError::cancelled(reason))
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cause(&self) -> Option<TetherError> {
        self.inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn abort_reason(&self) -> String {
        self.cause()
            .map(|cause| cause.to_string())
            .unwrap_or_else(|| "cancelled".to_string())
    }

    /// Error for an operation abandoned because of this token.
    ///
    /// Cancellation causes pass through unchanged; failure causes are
    /// rendered into a `Cancelled` reason so the abandoned call is never
    /// mistaken for a failure of its own.
    pub fn cancellation_error(&self) -> TetherError {
        match self.cause() {
            Some(cause) if cause.is_cancellation() => cause,
            Some(cause) => TetherError::cancelled(cause.to_string()),
            None => TetherError::cancelled("cancelled"),
        }
    }

    /// `Err(cause)` once the token is cancelled.
    pub fn check_cancelled(&self) -> TetherResult<()> {
        match self.cause() {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }

    /// Resolves once the token is cancelled. Cancel-safe.
    pub async fn cancelled(&self) {
        self.inner.signal.cancelled().await;
    }
}
