use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::commands::registry::{Invocation, RequestHandler};

/// Liveness probe. Replies "pong".
pub struct Ping;

#[async_trait]
impl RequestHandler for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    async fn handle(&self, invocation: &Invocation) -> Result<()> {
        invocation.reply.send("pong").await
    }
}

/// Echoes the `text` field of the input back to the caller.
pub struct Echo;

#[async_trait]
impl RequestHandler for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(&self, invocation: &Invocation) -> Result<()> {
        match invocation.input["text"].as_str() {
            Some(text) => invocation.reply.send(text).await,
            None => bail!("echo requires a string 'text' field"),
        }
    }
}
