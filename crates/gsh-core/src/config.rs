//! Batch settings

use std::time::Duration;

use gsh_exec::target::DEFAULT_PORT;

/// Default batch deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// How each host's output reaches the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Forward output live, unprefixed, possibly interleaved across hosts
    #[default]
    Streaming,
    /// Gather a host's whole output and print it with an `"<address>: "` prefix
    Buffered,
}

/// Inputs shared by every host in one batch
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Remote user for hosts without an embedded `user@`
    pub user: String,
    /// Shell command text, passed through unchanged
    pub command: String,
    /// Output handling
    pub mode: OutputMode,
    /// Deadline for the whole batch
    pub timeout: Duration,
    /// SSH port used for every host
    pub port: u16,
}

impl BatchSettings {
    /// Settings with default mode, timeout and port
    pub fn new(user: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            command: command.into(),
            mode: OutputMode::default(),
            timeout: DEFAULT_TIMEOUT,
            port: DEFAULT_PORT,
        }
    }

    /// Set output mode
    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set batch deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
