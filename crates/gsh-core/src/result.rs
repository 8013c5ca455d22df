//! Result types for host execution and whole batches

use gsh_exec::ExecError;

use crate::state::BatchState;

/// Outcome of running the command on one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Host entry as given, possibly `user@address`
    pub host: String,
    /// Bare address the command ran on
    pub address: String,
    /// Whether the command completed successfully
    pub success: bool,
    /// Lines to print, in order; empty when output was streamed
    pub lines: Vec<String>,
}

impl ExecutionResult {
    /// Successful result carrying already-formatted lines
    pub fn success(host: impl Into<String>, address: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            host: host.into(),
            address: address.into(),
            success: true,
            lines,
        }
    }

    /// Failed result with a single `"<address> error: <cause>"` line
    pub fn failure(host: impl Into<String>, address: impl Into<String>, err: &ExecError) -> Self {
        let address = address.into();
        let line = format!("{address} error: {err}");
        Self {
            host: host.into(),
            address,
            success: false,
            lines: vec![line],
        }
    }
}

/// Final state of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// `Completed` or `TimedOut`
    pub state: BatchState,
    /// Number of hosts dispatched
    pub attempted: usize,
    /// Results received before the deadline
    pub received: usize,
    /// Failed hosts, read once after collection
    pub errors: u64,
}

impl BatchOutcome {
    /// Whether the deadline fired before every host reported
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.state == BatchState::TimedOut
    }

    /// Success means no host failed at all
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}
