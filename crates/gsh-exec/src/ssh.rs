//! SSH transport using russh crate

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::keys::ssh_key::{self, HashAlg};
use russh::{ChannelMsg, Disconnect, client};
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::agent::AgentAuth;
use crate::error::ExecError;
use crate::sink::OutputSink;
use crate::target::Target;
use crate::traits::{CommandSession, Connection, Connector};

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler {
    address: String,
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        debug!(
            host = %self.address,
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "accepting server key"
        );
        Ok(true)
    }
}

/// Dials hosts over SSH and authenticates through the agent
#[derive(Clone)]
pub struct SshConnector {
    auth: AgentAuth,
    config: Arc<client::Config>,
    connect_timeout: Option<Duration>,
}

impl std::fmt::Debug for SshConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnector")
            .field("auth", &self.auth)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl SshConnector {
    /// Create a connector using `auth` for every host
    #[must_use]
    pub fn new(auth: AgentAuth) -> Self {
        Self {
            auth,
            config: Arc::new(client::Config::default()),
            connect_timeout: None,
        }
    }

    /// Limit how long dialing and key exchange may take per host
    #[must_use]
    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = Some(limit);
        self
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Connection = SshConnection;

    #[instrument(skip(self), fields(host = %target.address))]
    async fn connect(&self, target: &Target) -> Result<SshConnection, ExecError> {
        debug!(%target, "connecting to SSH");

        let handler = SshClientHandler {
            address: target.address.clone(),
        };
        let dial = client::connect(
            self.config.clone(),
            (target.address.as_str(), target.port),
            handler,
        );

        let connected = match self.connect_timeout {
            Some(limit) => timeout(limit, dial).await.map_err(|_| {
                ExecError::ConnectionFailed(format!("connection timed out after {limit:?}"))
            })?,
            None => dial.await,
        };
        let mut handle = connected.map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        self.auth.authenticate(&mut handle, &target.user).await?;

        info!(user = %target.user, "SSH connected and authenticated");

        Ok(SshConnection {
            address: target.address.clone(),
            handle,
        })
    }
}

/// Authenticated SSH connection
pub struct SshConnection {
    address: String,
    handle: client::Handle<SshClientHandler>,
}

impl std::fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnection")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for SshConnection {
    type Session = SshSession;

    async fn open_session(&mut self) -> Result<SshSession, ExecError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ExecError::SessionFailed(e.to_string()))?;

        Ok(SshSession { channel })
    }

    async fn disconnect(&mut self) -> Result<(), ExecError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| ExecError::Io(e.to_string()))?;
        debug!(host = %self.address, "SSH disconnected");
        Ok(())
    }
}

/// One `session` channel on an SSH connection
pub struct SshSession {
    channel: russh::Channel<client::Msg>,
}

/// How a remote command ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum Exit {
    Status(u32),
    Signal(String),
}

fn exit_result(exit: Option<Exit>) -> Result<(), ExecError> {
    match exit {
        Some(Exit::Status(0)) => Ok(()),
        Some(Exit::Status(status)) => Err(ExecError::CommandFailed { status }),
        Some(Exit::Signal(signal)) => Err(ExecError::Signaled(signal)),
        None => Err(ExecError::MissingExitStatus),
    }
}

#[async_trait]
impl CommandSession for SshSession {
    async fn run(&mut self, cmd: &str, sink: &mut dyn OutputSink) -> Result<(), ExecError> {
        self.channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::SessionFailed(e.to_string()))?;

        let mut exit = None;

        // The server may report the exit status after EOF, so read until
        // the channel itself closes.
        while let Some(msg) = self.channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => sink.stdout(&data).await?,
                ChannelMsg::ExtendedData { data, ext: 1 } => sink.stderr(&data).await?,
                ChannelMsg::ExitStatus { exit_status } => {
                    exit = Some(Exit::Status(exit_status));
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit = Some(Exit::Signal(format!("{signal_name:?}")));
                }
                _ => {}
            }
        }

        debug!(exit = ?exit, "remote command completed");

        exit_result(exit)
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        self.channel
            .close()
            .await
            .map_err(|e| ExecError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_result_mapping() {
        assert_eq!(exit_result(Some(Exit::Status(0))), Ok(()));
        assert_eq!(
            exit_result(Some(Exit::Status(2))),
            Err(ExecError::CommandFailed { status: 2 })
        );
        assert_eq!(
            exit_result(Some(Exit::Signal("KILL".to_string()))),
            Err(ExecError::Signaled("KILL".to_string()))
        );
        assert_eq!(exit_result(None), Err(ExecError::MissingExitStatus));
    }

    // These tests require an SSH server and a loaded agent
    #[tokio::test]
    #[ignore = "requires SSH server"]
    async fn test_ssh_run_echo() {
        let provider = crate::agent::CredentialProvider::open().await.unwrap();
        let connector = SshConnector::new(provider.auth_method());
        let user = std::env::var("USER").unwrap();

        let mut conn = connector
            .connect(&Target::new("127.0.0.1", user))
            .await
            .unwrap();
        let mut session = conn.open_session().await.unwrap();
        let mut sink = crate::sink::CaptureSink::new();
        session.run("echo hello", &mut sink).await.unwrap();

        assert_eq!(sink.lines(), vec!["hello"]);
        conn.disconnect().await.unwrap();
    }
}
