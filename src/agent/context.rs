use std::sync::Arc;

use crate::agent::config::Config;
use crate::commands::{HandlerDispatcher, HandlerRegistry, LifecycleDispatcher};
use crate::security::{AuditLogger, CredentialRotator};

/// Process-wide context built once at startup and passed explicitly to
/// everything that needs it. Owns the credential cache and both handler
/// registries; there are no hidden statics.
#[derive(Clone)]
pub struct AgentContext {
    pub config: Arc<Config>,
    pub rotator: CredentialRotator,
    pub dispatcher: HandlerDispatcher,
    pub lifecycle: LifecycleDispatcher,
    pub audit: AuditLogger,
}

impl AgentContext {
    /// Freeze the request-handler registry and assemble the context.
    pub fn new(config: Arc<Config>, registry: HandlerRegistry) -> Self {
        let audit = AuditLogger::new();
        Self {
            config,
            rotator: CredentialRotator::new(),
            dispatcher: HandlerDispatcher::new(registry, audit.clone()),
            lifecycle: LifecycleDispatcher::new(),
            audit,
        }
    }
}
