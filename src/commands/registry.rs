use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::commands::reply::Reply;

/// A single command invocation: the caller's input plus the handle the
/// handler replies through.
pub struct Invocation {
    pub input: Value,
    pub reply: Arc<dyn Reply>,
}

/// A named request handler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, invocation: &Invocation) -> Result<()>;
}

/// Startup-time, append-only collection of request handlers.
///
/// Populated before any dispatch happens and frozen into the dispatcher
/// afterwards; there is no unregistration.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name. Names are unique; a duplicate
    /// replaces the earlier registration with a warning.
    pub fn register(&mut self, handler: Arc<dyn RequestHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!(command = %name, "duplicate handler registration, replacing");
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn into_inner(self) -> HashMap<String, Arc<dyn RequestHandler>> {
        self.handlers
    }
}
