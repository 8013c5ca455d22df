//! Core error types for gsh-core

use thiserror::Error;

use crate::state::BatchState;

/// Errors that abort a whole batch
///
/// Per-host failures never surface here; they become failed
/// [`ExecutionResult`](crate::ExecutionResult)s instead.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Nothing to run on
    #[error("no hosts given")]
    NoHosts,

    /// Invalid state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: BatchState,
        /// Attempted target state
        to: BatchState,
    },

    /// Writing results to the output stream failed
    #[error("failed to write output: {0}")]
    Output(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Output(err.to_string())
    }
}
