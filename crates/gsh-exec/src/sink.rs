//! Destinations for remote command output

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Receives the stdout and stderr of a running remote command
#[async_trait]
pub trait OutputSink: Send {
    /// Handle a chunk of standard output
    async fn stdout(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Handle a chunk of standard error
    async fn stderr(&mut self, data: &[u8]) -> std::io::Result<()>;
}

/// Captures stdout and stderr into one buffer, in arrival order
#[derive(Debug, Default)]
pub struct CaptureSink {
    buf: Vec<u8>,
}

impl CaptureSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured bytes decoded as UTF-8, lossily
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    /// Split the capture into lines
    ///
    /// A single trailing newline is dropped first, so `"a\nb\n"` yields two
    /// lines and an empty capture yields one empty line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let text = self.text();
        let text = text.strip_suffix('\n').unwrap_or(&text);
        text.split('\n').map(str::to_string).collect()
    }
}

#[async_trait]
impl OutputSink for CaptureSink {
    async fn stdout(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    async fn stderr(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }
}

/// Forwards output unmodified to a pair of writers
#[derive(Debug)]
pub struct PassthroughSink<O, E> {
    out: O,
    err: E,
}

impl<O, E> PassthroughSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }
}

impl PassthroughSink<tokio::io::Stdout, tokio::io::Stderr> {
    /// Forward to this process's own stdout and stderr
    #[must_use]
    pub fn process() -> Self {
        Self::new(tokio::io::stdout(), tokio::io::stderr())
    }
}

#[async_trait]
impl<O, E> OutputSink for PassthroughSink<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    async fn stdout(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.out.write_all(data).await?;
        self.out.flush().await
    }

    async fn stderr(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.err.write_all(data).await?;
        self.err.flush().await
    }
}
