//! Transport traits
//!
//! A [`Connector`] dials and authenticates one host, yielding a
//! [`Connection`]; the connection opens a [`CommandSession`] that runs a
//! single command. Each stage reports its own [`ExecError`] variant so the
//! executor can tell connection, session and command failures apart.

use async_trait::async_trait;

use crate::error::ExecError;
use crate::sink::OutputSink;
use crate::target::Target;

/// Establishes authenticated connections to remote hosts
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Connect to `target` and authenticate as `target.user`
    async fn connect(&self, target: &Target) -> Result<Self::Connection, ExecError>;
}

/// An authenticated connection to one host
#[async_trait]
pub trait Connection: Send {
    type Session: CommandSession;

    /// Open a command-execution session
    async fn open_session(&mut self) -> Result<Self::Session, ExecError>;

    /// Tear down the connection
    async fn disconnect(&mut self) -> Result<(), ExecError>;
}

/// A session able to run exactly one command
#[async_trait]
pub trait CommandSession: Send {
    /// Run `cmd`, relaying its output into `sink` until it exits
    ///
    /// Returns `Ok` only when the command exits with status 0.
    async fn run(&mut self, cmd: &str, sink: &mut dyn OutputSink) -> Result<(), ExecError>;

    /// Release the session
    async fn close(&mut self) -> Result<(), ExecError>;
}
