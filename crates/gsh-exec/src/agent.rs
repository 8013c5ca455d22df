//! SSH agent credential provider
//!
//! Private keys stay inside the agent. We only hold the public identities
//! and ask the agent to sign authentication challenges on our behalf.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use russh::keys::agent::client::AgentClient;
use russh::keys::ssh_key::{HashAlg, PublicKey};
use russh::{CryptoVec, Signer, client};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{AgentError, ExecError, SignError};

/// Environment variable naming the agent socket
pub const AUTH_SOCK_ENV: &str = "SSH_AUTH_SOCK";

/// Connection to the local SSH agent, held for one batch
///
/// [`CredentialProvider::close`] drops every agent connection, including the
/// ones lent to in-flight authentications once they hand them back.
pub struct CredentialProvider {
    auth: AgentAuth,
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("socket", &self.auth.pool.socket)
            .field("identities", &self.auth.identities.len())
            .finish_non_exhaustive()
    }
}

impl CredentialProvider {
    /// Connect to the agent named by `SSH_AUTH_SOCK`
    ///
    /// # Errors
    /// Returns `AgentError` if the variable is unset or the agent is unreachable
    pub async fn open() -> Result<Self, AgentError> {
        let socket = std::env::var_os(AUTH_SOCK_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .ok_or(AgentError::SocketUnset)?;

        Self::open_at(socket).await
    }

    /// Connect to the agent listening on `socket`
    ///
    /// # Errors
    /// Returns `AgentError` if the socket cannot be reached or the identity
    /// list cannot be read
    #[instrument(skip_all, fields(socket = %socket.as_ref().display()))]
    pub async fn open_at(socket: impl AsRef<Path>) -> Result<Self, AgentError> {
        let socket = socket.as_ref().to_path_buf();

        let mut agent =
            AgentClient::connect_uds(&socket)
                .await
                .map_err(|e| AgentError::Unavailable {
                    path: socket.clone(),
                    reason: e.to_string(),
                })?;

        let identities: Vec<PublicKey> = agent
            .request_identities()
            .await
            .map_err(|e| AgentError::Identities(e.to_string()))?;

        if identities.is_empty() {
            warn!("SSH agent holds no identities, authentication will fail");
        }
        for key in &identities {
            debug!(fingerprint = %key.fingerprint(HashAlg::Sha256), "agent identity");
        }
        info!(identities = identities.len(), "connected to SSH agent");

        Ok(Self {
            auth: AgentAuth {
                pool: Arc::new(AgentPool {
                    socket,
                    idle: Mutex::new(Some(vec![agent])),
                }),
                identities: identities.into(),
            },
        })
    }

    /// Authentication method backed by this agent
    ///
    /// Clones share the identity list and the agent connection pool.
    #[must_use]
    pub fn auth_method(&self) -> AgentAuth {
        self.auth.clone()
    }

    /// Release the agent connections
    ///
    /// Authentications that start afterwards fail with "agent closed".
    pub async fn close(self) {
        let released = self.auth.pool.close().await;
        debug!(
            socket = %self.auth.pool.socket.display(),
            released,
            "closed SSH agent connection"
        );
    }
}

/// Idle agent connections, `None` once closed
///
/// The agent answers one request at a time per socket, so a sign request
/// borrows a connection of its own and only holds the lock to take or return
/// one.
struct AgentPool {
    socket: PathBuf,
    idle: Mutex<Option<Vec<AgentClient<UnixStream>>>>,
}

impl AgentPool {
    async fn checkout(&self) -> Result<AgentClient<UnixStream>, SignError> {
        let reused = match self.idle.lock().await.as_mut() {
            Some(idle) => idle.pop(),
            None => return Err(SignError::Closed),
        };

        match reused {
            Some(agent) => Ok(agent),
            None => {
                debug!(socket = %self.socket.display(), "opening extra SSH agent connection");
                Ok(AgentClient::connect_uds(&self.socket).await?)
            }
        }
    }

    async fn checkin(&self, agent: AgentClient<UnixStream>) {
        // After close the connection is dropped here
        if let Some(idle) = self.idle.lock().await.as_mut() {
            idle.push(agent);
        }
    }

    async fn is_closed(&self) -> bool {
        self.idle.lock().await.is_none()
    }

    async fn close(&self) -> usize {
        self.idle.lock().await.take().map_or(0, |idle| idle.len())
    }
}

/// Public-key authentication signed by the SSH agent
///
/// The identity list is fixed when the provider opens.
#[derive(Clone)]
pub struct AgentAuth {
    pool: Arc<AgentPool>,
    identities: Arc<[PublicKey]>,
}

impl std::fmt::Debug for AgentAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAuth")
            .field("identities", &self.identities.len())
            .finish_non_exhaustive()
    }
}

fn rejected(user: &str, reason: impl ToString) -> ExecError {
    ExecError::AuthenticationFailed {
        user: user.to_string(),
        reason: reason.to_string(),
    }
}

impl AgentAuth {
    /// Signer handed to russh for each challenge
    #[must_use]
    pub fn signer(&self) -> AgentSigner {
        AgentSigner {
            pool: Arc::clone(&self.pool),
        }
    }

    /// Fail early when no authentication attempt can succeed
    async fn check_ready(&self, user: &str) -> Result<(), ExecError> {
        if self.identities.is_empty() {
            return Err(rejected(user, "SSH agent holds no identities"));
        }
        if self.pool.is_closed().await {
            return Err(rejected(user, SignError::Closed));
        }
        Ok(())
    }

    /// Authenticate `session` as `user`, trying each agent identity in turn
    ///
    /// # Errors
    /// Returns `ExecError::AuthenticationFailed` when no identity is accepted
    pub async fn authenticate<H: client::Handler>(
        &self,
        session: &mut client::Handle<H>,
        user: &str,
    ) -> Result<(), ExecError> {
        self.check_ready(user).await?;

        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();

        let mut signer = self.signer();
        for key in self.identities.iter() {
            let auth_res = session
                .authenticate_publickey_with(user, key.clone(), hash_alg, &mut signer)
                .await
                .map_err(|e| rejected(user, e))?;

            if auth_res.success() {
                debug!(user, fingerprint = %key.fingerprint(HashAlg::Sha256), "authenticated");
                return Ok(());
            }
        }

        Err(rejected(user, "no agent identity was accepted"))
    }
}

/// Signs userauth challenges through a pooled agent connection
///
/// A host stalled in userauth never holds the agent: the pool lock covers
/// only taking and returning a connection.
#[derive(Clone)]
pub struct AgentSigner {
    pool: Arc<AgentPool>,
}

impl std::fmt::Debug for AgentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSigner")
            .field("socket", &self.pool.socket)
            .finish()
    }
}

impl Signer for AgentSigner {
    type Error = SignError;

    fn auth_publickey_sign(
        &mut self,
        key: &PublicKey,
        hash_alg: Option<HashAlg>,
        to_sign: CryptoVec,
    ) -> impl Future<Output = Result<CryptoVec, Self::Error>> + Send {
        let pool = Arc::clone(&self.pool);
        let key = key.clone();

        async move {
            let mut agent = pool.checkout().await?;
            // A failed request may leave a half-read reply, so the connection is not reused
            let signature = agent.sign_request(&key, hash_alg, to_sign).await?;
            pool.checkin(agent).await;
            Ok(signature)
        }
    }
}
