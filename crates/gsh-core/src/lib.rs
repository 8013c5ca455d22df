//! gsh-core: Batch dispatch and collection
//!
//! Runs one command on many hosts at once. The [`Dispatcher`] spawns a
//! [`RemoteExecutor`] task per host, prints results as they arrive and stops
//! at a single batch-wide deadline.

pub mod config;
pub mod counter;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod result;
pub mod state;

pub use config::{BatchSettings, DEFAULT_TIMEOUT, OutputMode};
pub use counter::ErrorCounter;
pub use dispatcher::{Dispatcher, TIMEOUT_INDICATOR};
pub use error::CoreError;
pub use executor::RemoteExecutor;
pub use result::{BatchOutcome, ExecutionResult};
pub use state::BatchState;
