use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Caller-facing response handle for a single command invocation.
///
/// Handlers own success replies; the dispatcher only touches this to deliver
/// the one generic failure notice, choosing `amend` over `send` when part of
/// a response has already gone out.
#[async_trait]
pub trait Reply: Send + Sync {
    /// Whether any part of a response has already been sent.
    fn started(&self) -> bool;

    async fn send(&self, text: &str) -> Result<()>;

    /// Revise an already-started response.
    async fn amend(&self, text: &str) -> Result<()>;
}

/// Reply that forwards chunks over an in-process channel.
pub struct ChannelReply {
    started: AtomicBool,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelReply {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reply = Arc::new(Self {
            started: AtomicBool::new(false),
            tx,
        });
        (reply, rx)
    }
}

#[async_trait]
impl Reply for ChannelReply {
    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        self.tx
            .send(text.to_string())
            .map_err(|_| anyhow!("reply channel closed"))
    }

    async fn amend(&self, text: &str) -> Result<()> {
        self.tx
            .send(text.to_string())
            .map_err(|_| anyhow!("reply channel closed"))
    }
}

/// Sink for fire-and-forget dispatches with no caller waiting on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReply;

#[async_trait]
impl Reply for NullReply {
    fn started(&self) -> bool {
        false
    }

    async fn send(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn amend(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}
