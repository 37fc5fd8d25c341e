//! Output sinks: where injected messages end up after routing.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::{mpsc, Mutex};

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;

#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn write(&self, msg: &Message) -> Result<()>;
}

/// Writes each payload to stdout as-is.
pub struct StdoutSink {
    out: Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    async fn write(&self, msg: &Message) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(msg.payload.as_bytes())
            .await
            .map_err(|e| LogCountError::Internal(format!("stdout write failed: {e}")))?;
        out.flush()
            .await
            .map_err(|e| LogCountError::Internal(format!("stdout flush failed: {e}")))
    }
}

/// Forwards copies of output messages to a channel (embedding and tests).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn write(&self, msg: &Message) -> Result<()> {
        self.tx
            .send(msg.clone())
            .map_err(|_| LogCountError::Internal("output receiver dropped".into()))
    }
}
