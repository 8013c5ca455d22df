//! Scripted transport for batch tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gsh_exec::sink::OutputSink;
use gsh_exec::traits::{CommandSession, Connection, Connector};
use gsh_exec::{ExecError, Target};

/// What a mock host does when the command runs
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Print `text` after `delay`, exit 0
    Output { text: String, delay: Duration },
    /// Refuse the connection
    Refuse(String),
    /// Connect, then fail to open a session
    NoSession(String),
    /// Print `text`, exit with `status`
    Exit { text: String, status: u32 },
}

impl Behavior {
    pub fn output(text: &str) -> Self {
        Behavior::Output {
            text: text.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Behavior::Output {
            text: text.to_string(),
            delay,
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub logins: Mutex<Vec<(String, String)>>,
    pub sessions_closed: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl Stats {
    /// `(address, user)` pairs in connect order
    pub fn logins(&self) -> Vec<(String, String)> {
        self.logins.lock().unwrap().clone()
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

pub struct MockConnector {
    hosts: HashMap<String, Behavior>,
    fallback: Behavior,
    stats: Arc<Stats>,
}

impl MockConnector {
    /// Every unknown host prints `"<address> ok"`
    pub fn new() -> Self {
        Self {
            hosts: HashMap::new(),
            fallback: Behavior::output("ok\n"),
            stats: Arc::new(Stats::default()),
        }
    }

    pub fn with_host(mut self, address: &str, behavior: Behavior) -> Self {
        self.hosts.insert(address.to_string(), behavior);
        self
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, target: &Target) -> Result<MockConnection, ExecError> {
        self.stats
            .logins
            .lock()
            .unwrap()
            .push((target.address.clone(), target.user.clone()));

        let behavior = self
            .hosts
            .get(&target.address)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        if let Behavior::Refuse(cause) = behavior {
            return Err(ExecError::ConnectionFailed(cause));
        }

        Ok(MockConnection {
            behavior,
            stats: Arc::clone(&self.stats),
        })
    }
}

pub struct MockConnection {
    behavior: Behavior,
    stats: Arc<Stats>,
}

#[async_trait]
impl Connection for MockConnection {
    type Session = MockSession;

    async fn open_session(&mut self) -> Result<MockSession, ExecError> {
        if let Behavior::NoSession(cause) = &self.behavior {
            return Err(ExecError::SessionFailed(cause.clone()));
        }
        Ok(MockSession {
            behavior: self.behavior.clone(),
            stats: Arc::clone(&self.stats),
        })
    }

    async fn disconnect(&mut self) -> Result<(), ExecError> {
        self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockSession {
    behavior: Behavior,
    stats: Arc<Stats>,
}

#[async_trait]
impl CommandSession for MockSession {
    async fn run(&mut self, _cmd: &str, sink: &mut dyn OutputSink) -> Result<(), ExecError> {
        match &self.behavior {
            Behavior::Output { text, delay } => {
                tokio::time::sleep(*delay).await;
                sink.stdout(text.as_bytes()).await?;
                Ok(())
            }
            Behavior::Exit { text, status } => {
                sink.stderr(text.as_bytes()).await?;
                Err(ExecError::CommandFailed { status: *status })
            }
            Behavior::Refuse(_) | Behavior::NoSession(_) => unreachable!(),
        }
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        self.stats.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

pub fn printed(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn sorted(mut lines: Vec<String>) -> Vec<String> {
    lines.sort();
    lines
}
