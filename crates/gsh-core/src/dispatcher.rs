//! `Dispatcher`: batch-wide fan-out and collection
//!
//! All hosts are dispatched at once, one task each. Results come back over a
//! single channel and are printed in arrival order until either every host
//! has reported or the batch deadline fires. Tasks still running at the
//! deadline are abandoned, not cancelled.

use std::io::Write;
use std::sync::Arc;

use gsh_exec::traits::Connector;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::config::BatchSettings;
use crate::counter::ErrorCounter;
use crate::error::CoreError;
use crate::executor::RemoteExecutor;
use crate::result::{BatchOutcome, ExecutionResult};
use crate::state::BatchState;

/// Line printed when the deadline cuts collection short
pub const TIMEOUT_INDICATOR: &str = "!! - Timed out - !!";

/// Runs batches of hosts through one connector
pub struct Dispatcher<C: Connector> {
    connector: Arc<C>,
    settings: Arc<BatchSettings>,
}

impl<C: Connector> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Dispatcher<C> {
    /// Create a dispatcher
    pub fn new(connector: C, settings: BatchSettings) -> Self {
        Self {
            connector: Arc::new(connector),
            settings: Arc::new(settings),
        }
    }

    /// Batch settings
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Run the command on every host, printing result lines to `out`
    ///
    /// Stdout is written on two paths. Result lines, error lines and the
    /// timeout indicator go through `out` with blocking `std::io::Write`,
    /// one line and a flush at a time, from the collecting task. In streaming
    /// mode each host task also writes its command output straight to
    /// `tokio::io::stdout()`. The two paths interleave only at chunk
    /// boundaries.
    ///
    /// # Errors
    /// Returns `CoreError::NoHosts` for an empty host list and
    /// `CoreError::Output` if `out` cannot be written. Host failures are not
    /// errors; they are counted in the returned outcome.
    pub async fn run<W: Write>(
        &self,
        hosts: &[String],
        out: &mut W,
    ) -> Result<BatchOutcome, CoreError> {
        if hosts.is_empty() {
            return Err(CoreError::NoHosts);
        }

        let deadline = Instant::now() + self.settings.timeout;
        let errors = ErrorCounter::new();
        let mut state = BatchState::Dispatching;

        info!(
            hosts = hosts.len(),
            timeout = ?self.settings.timeout,
            mode = ?self.settings.mode,
            "dispatching batch"
        );

        // Room for every result, so no task ever waits on the collector
        let (result_tx, mut result_rx) = mpsc::channel::<ExecutionResult>(hosts.len());
        let executor = RemoteExecutor::new(
            Arc::clone(&self.connector),
            Arc::clone(&self.settings),
            errors.clone(),
        );

        for host in hosts {
            let executor = executor.clone();
            let result_tx = result_tx.clone();
            let host = host.clone();
            tokio::spawn(async move {
                let result = executor.run(&host).await;
                // Receiver is gone once the batch has timed out
                let _ = result_tx.send(result).await;
            });
        }
        drop(result_tx);

        transition(&mut state, BatchState::Collecting)?;

        let timer = sleep_until(deadline);
        tokio::pin!(timer);

        let mut received = 0;
        let mut timed_out = false;

        for _ in 0..hosts.len() {
            tokio::select! {
                biased;

                next = result_rx.recv() => {
                    let Some(result) = next else { break };
                    received += 1;
                    for line in &result.lines {
                        writeln!(out, "{line}")?;
                    }
                    out.flush()?;
                }
                () = &mut timer => {
                    writeln!(out, "{TIMEOUT_INDICATOR}")?;
                    out.flush()?;
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            transition(&mut state, BatchState::TimedOut)?;
        } else {
            // Only a panicked task can drop its sender without reporting
            for _ in received..hosts.len() {
                errors.increment();
            }
            if received < hosts.len() {
                warn!(
                    missing = hosts.len() - received,
                    "executor tasks ended without reporting"
                );
            }
            transition(&mut state, BatchState::Completed)?;
        }

        let outcome = BatchOutcome {
            state,
            attempted: hosts.len(),
            received,
            errors: errors.get(),
        };

        info!(
            state = %outcome.state,
            received = outcome.received,
            errors = outcome.errors,
            "batch finished"
        );

        Ok(outcome)
    }
}

fn transition(state: &mut BatchState, next: BatchState) -> Result<(), CoreError> {
    if !state.can_transition_to(next) {
        return Err(CoreError::InvalidTransition {
            from: *state,
            to: next,
        });
    }
    *state = next;
    Ok(())
}
