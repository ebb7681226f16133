//! Error types shared by the coordinator and the server surfaces.
//!
//! A `TetherError` doubles as a cancellation cause, which is why it is
//! `Clone + PartialEq`: the token hands out copies of the recorded cause to
//! every observer.

use thiserror::Error;

/// Errors raised while coordinating workers or serving requests.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TetherError {
    /// Outbound call could not be constructed or completed.
    #[error("in {origin}: {message}")]
    Transport { origin: String, message: String },

    /// Outbound call completed with a status the caller treats as fatal.
    #[error("in {origin}: bad status {status}")]
    Application { origin: String, status: u16 },

    /// Cooperative shutdown.
    #[error("cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("deadline exceeded after {after_ms}ms")]
    DeadlineExceeded { after_ms: u64 },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("event sink {sink} failed: {message}")]
    Sink { sink: String, message: String },

    #[error("{message}")]
    Logic { message: String },
}

impl TetherError {
    pub fn transport(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for the cooperative-shutdown variants, which are not failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}

pub type TetherResult<T> = Result<T, TetherError>;
