//! Error types for gsh-exec

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running a command on one host
///
/// Every variant is recoverable at the host level: the executor turns it into
/// a single `"<address> error: <cause>"` line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Failed to reach the remote host (DNS, refusal, transport timeout)
    #[error("{0}")]
    ConnectionFailed(String),

    /// Every agent identity was rejected by the server
    #[error("unable to authenticate as {user}: {reason}")]
    AuthenticationFailed {
        /// Remote user the attempt was made for
        user: String,
        /// Why authentication failed
        reason: String,
    },

    /// Connected, but no command session could be opened
    #[error("failed to open session: {0}")]
    SessionFailed(String),

    /// Remote command exited with a non-zero status
    #[error("command exited with status {status}")]
    CommandFailed {
        /// Exit status code
        status: u32,
    },

    /// Remote command was terminated by a signal
    #[error("command killed by signal {0}")]
    Signaled(String),

    /// Channel closed before the server reported an exit status
    #[error("command exited without exit status or exit signal")]
    MissingExitStatus,

    /// I/O error while relaying output
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExecError {
    /// Whether the failure happened before the command started running
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ExecError::ConnectionFailed(_) | ExecError::AuthenticationFailed { .. }
        )
    }
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        ExecError::Io(err.to_string())
    }
}

/// Errors raised while opening the SSH agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// `SSH_AUTH_SOCK` is not set
    #[error("SSH_AUTH_SOCK is not set; is ssh-agent running?")]
    SocketUnset,

    /// Socket exists in the environment but cannot be reached
    #[error("cannot connect to SSH agent at {path}: {reason}")]
    Unavailable {
        /// Socket path that was tried
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Agent answered but listing identities failed
    #[error("failed to list agent identities: {0}")]
    Identities(String),
}

/// Errors raised while the agent signs an authentication challenge
#[derive(Error, Debug)]
pub enum SignError {
    /// The credential provider was closed
    #[error("agent closed")]
    Closed,

    /// The agent could not be reached or refused to sign
    #[error("agent signing failed: {0}")]
    Agent(#[from] russh::keys::Error),

    /// The SSH session went away while signing
    #[error(transparent)]
    Session(#[from] russh::SendError),
}
