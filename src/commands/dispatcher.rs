use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::commands::registry::{HandlerRegistry, Invocation, RequestHandler};
use crate::commands::reply::Reply;
use crate::security::AuditLogger;

/// Generic notice sent to the caller when a handler fails. Deliberately free
/// of diagnostic detail; the specifics go to the logs.
const FAILURE_NOTICE: &str = "Something went wrong while running that command.";

/// Routes named invocations to registered handlers, one tracked task per
/// call, and contains every handler failure at this boundary.
#[derive(Clone)]
pub struct HandlerDispatcher {
    handlers: Arc<HashMap<String, Arc<dyn RequestHandler>>>,
    audit: AuditLogger,
}

impl HandlerDispatcher {
    /// Freeze a populated registry. No further registration is possible.
    pub fn new(registry: HandlerRegistry, audit: AuditLogger) -> Self {
        Self {
            handlers: Arc::new(registry.into_inner()),
            audit,
        }
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Invoke the handler registered under `name`.
    ///
    /// Unknown names are tolerated as a silent no-op. A known handler runs in
    /// its own spawned task whose outcome is always observed here: an `Err`
    /// is logged with the handler's name and answered with exactly one
    /// best-effort failure notice through the invocation's reply handle.
    /// Nothing a handler does can propagate past this point, and concurrent
    /// dispatches never block one another.
    pub fn dispatch(&self, name: &str, input: Value, reply: Arc<dyn Reply>) -> Option<JoinHandle<()>> {
        let handler = match self.handlers.get(name) {
            Some(handler) => Arc::clone(handler),
            None => {
                debug!(command = %name, "no handler registered, ignoring");
                return None;
            }
        };

        let name = name.to_string();
        let audit = self.audit.clone();
        Some(tokio::spawn(async move {
            let invocation = Invocation { input, reply };
            if let Err(err) = handler.handle(&invocation).await {
                error!(handler = %name, error = %err, "command handler failed");
                audit.handler_failed(&name, &err.to_string());

                let notice = if invocation.reply.started() {
                    invocation.reply.amend(FAILURE_NOTICE).await
                } else {
                    invocation.reply.send(FAILURE_NOTICE).await
                };
                if let Err(notify_err) = notice {
                    // Secondary failure stops here; it is never re-thrown.
                    warn!(handler = %name, error = %notify_err, "failure notice undeliverable");
                    audit.notify_failed(&name, &notify_err.to_string());
                }
            }
        }))
    }
}
