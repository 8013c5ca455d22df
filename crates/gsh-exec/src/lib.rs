//! gsh-exec: SSH transport for gsh
//!
//! Agent-backed credentials, the russh connector, and the transport traits the
//! batch engine drives.

pub mod agent;
pub mod error;
pub mod sink;
pub mod ssh;
pub mod target;
pub mod traits;

pub use agent::{AgentAuth, AgentSigner, CredentialProvider};
pub use error::{AgentError, ExecError, SignError};
pub use sink::{CaptureSink, OutputSink, PassthroughSink};
pub use ssh::SshConnector;
pub use target::Target;
pub use traits::{CommandSession, Connection, Connector};
