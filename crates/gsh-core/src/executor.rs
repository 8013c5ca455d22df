//! `RemoteExecutor`: per-host command execution
//!
//! Every failure is contained here. The caller always gets an
//! [`ExecutionResult`]; failed hosts also bump the batch's [`ErrorCounter`].

use std::sync::Arc;

use gsh_exec::sink::{CaptureSink, PassthroughSink};
use gsh_exec::traits::{CommandSession, Connection, Connector};
use gsh_exec::{ExecError, Target};
use tracing::{debug, instrument, warn};

use crate::config::{BatchSettings, OutputMode};
use crate::counter::ErrorCounter;
use crate::result::ExecutionResult;

/// Runs the batch command on one host at a time
pub struct RemoteExecutor<C: Connector> {
    connector: Arc<C>,
    settings: Arc<BatchSettings>,
    errors: ErrorCounter,
}

impl<C: Connector> Clone for RemoteExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            settings: Arc::clone(&self.settings),
            errors: self.errors.clone(),
        }
    }
}

impl<C: Connector> std::fmt::Debug for RemoteExecutor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteExecutor")
            .field("settings", &self.settings)
            .field("errors", &self.errors.get())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> RemoteExecutor<C> {
    /// Create an executor reporting failures to `errors`
    pub fn new(connector: Arc<C>, settings: Arc<BatchSettings>, errors: ErrorCounter) -> Self {
        Self {
            connector,
            settings,
            errors,
        }
    }

    /// Run the command on `host`
    ///
    /// `host` may carry its own user as `user@address`.
    #[instrument(skip(self), fields(mode = ?self.settings.mode))]
    pub async fn run(&self, host: &str) -> ExecutionResult {
        let target = Target::parse(host, &self.settings.user).with_port(self.settings.port);

        match self.execute(&target).await {
            Ok(lines) => {
                debug!(address = %target.address, lines = lines.len(), "host succeeded");
                ExecutionResult::success(host, &target.address, lines)
            }
            Err(err) => {
                self.errors.increment();
                warn!(
                    %target,
                    error = %err,
                    before_command = err.is_connection_error(),
                    "host failed"
                );
                ExecutionResult::failure(host, &target.address, &err)
            }
        }
    }

    async fn execute(&self, target: &Target) -> Result<Vec<String>, ExecError> {
        let mut conn = self.connector.connect(target).await?;

        let outcome = self.run_session(&mut conn, target).await;

        if let Err(e) = conn.disconnect().await {
            debug!(address = %target.address, error = %e, "disconnect failed");
        }

        outcome
    }

    async fn run_session(
        &self,
        conn: &mut C::Connection,
        target: &Target,
    ) -> Result<Vec<String>, ExecError> {
        let mut session = conn.open_session().await?;
        let command = &self.settings.command;

        let outcome = match self.settings.mode {
            OutputMode::Streaming => {
                let mut sink = PassthroughSink::process();
                session.run(command, &mut sink).await.map(|()| Vec::new())
            }
            OutputMode::Buffered => {
                let mut sink = CaptureSink::new();
                session.run(command, &mut sink).await.map(|()| {
                    sink.lines()
                        .into_iter()
                        .map(|line| format!("{}: {line}", target.address))
                        .collect()
                })
            }
        };

        if let Err(e) = session.close().await {
            debug!(address = %target.address, error = %e, "session close failed");
        }

        outcome
    }
}
