//! gsh: group shell
//!
//! Runs one shell command on many hosts at once over SSH, authenticating
//! through the local SSH agent.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use color_eyre::Result;
use eyre::WrapErr;
use gsh_core::{BatchSettings, Dispatcher, OutputMode};
use gsh_exec::{CredentialProvider, SshConnector};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod hosts;

use config::Config;

/// Run a shell command on many hosts over SSH
#[derive(Parser, Debug)]
#[command(name = "gsh", version, about, long_about = None)]
struct Args {
    /// Username for hosts given without `user@`
    #[arg(short, long)]
    user: Option<String>,

    /// Comma separated list of hosts
    #[arg(long, value_name = "HOST,...")]
    hosts: Option<String>,

    /// Host group read from ~/.gsh/<GROUP>, one host per line
    #[arg(short = 'g', long)]
    group: Option<String>,

    /// Timeout for the whole batch, in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Buffer each host's output and prefix it with the host address
    #[arg(short, long)]
    buffer: bool,

    /// SSH port
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file (default ~/.gsh/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Command to run on every host
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn init_tracing(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Keep stdout for command output
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let config = Config::load_default(args.config.as_deref()).wrap_err("failed to load config")?;
    init_tracing(args.verbose, &config.log_level);

    let hosts = hosts::resolve(args.hosts.as_deref(), args.group.as_deref())?;
    if hosts.is_empty() {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no hosts given; use --hosts or --group",
            )
            .exit();
    }

    let user = hosts::resolve_user(args.user.as_deref(), config.user.as_deref())?;
    let mode = if args.buffer {
        OutputMode::Buffered
    } else {
        config.output_mode()
    };
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.timeout));

    let settings = BatchSettings::new(user, args.command.join(" "))
        .with_mode(mode)
        .with_timeout(timeout)
        .with_port(args.port.unwrap_or(config.port));
    debug!(?settings, hosts = hosts.len(), "resolved batch");

    let provider = CredentialProvider::open()
        .await
        .wrap_err("SSH agent unavailable")?;

    let mut connector = SshConnector::new(provider.auth_method());
    if let Some(limit) = config.connect_timeout() {
        connector = connector.with_connect_timeout(limit);
    }

    let dispatcher = Dispatcher::new(connector, settings);
    let outcome = dispatcher.run(&hosts, &mut std::io::stdout()).await;

    // Tasks abandoned at the deadline keep their own handles to the agent
    drop(dispatcher);
    provider.close().await;

    let outcome = outcome?;
    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
