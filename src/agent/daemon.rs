use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::agent::config::Config;
use crate::agent::context::AgentContext;
use crate::commands::{builtin, HandlerRegistry, LifecycleHandler, SubscriptionMode};
use crate::security::CredentialError;
use crate::transport::internal_api::InternalApiClient;

/// Announces the agent's startup payload to the internal API, once.
struct StartupAnnouncer {
    client: InternalApiClient,
}

#[async_trait]
impl LifecycleHandler for StartupAnnouncer {
    async fn handle(&self, payload: &Value) -> Result<()> {
        self.client.post_event("startup", payload).await
    }
}

struct StartupLogger;

#[async_trait]
impl LifecycleHandler for StartupLogger {
    async fn handle(&self, payload: &Value) -> Result<()> {
        info!(payload = %payload, "agent ready");
        Ok(())
    }
}

/// Build the context, attach lifecycle subscribers, then serve the local API
/// until ctrl-c.
pub async fn run(config_path: String, port_override: Option<u16>) -> Result<()> {
    let mut cfg = Config::from_file(&config_path)?;
    if let Some(port) = port_override {
        cfg.port = port;
    }
    let cfg = Arc::new(cfg);

    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(builtin::Ping));
    registry.register(Arc::new(builtin::Echo));
    info!(
        agent_id = %cfg.agent_id,
        port = cfg.port,
        commands = registry.len(),
        "relay agent starting"
    );
    let ctx = Arc::new(AgentContext::new(cfg.clone(), registry));

    // Surface misconfiguration early; validation itself stays non-fatal and
    // starts working as soon as the secret appears in the environment.
    if let Err(CredentialError::MissingSecret) = ctx.rotator.current().await {
        ctx.audit.missing_secret();
    }

    // Registration happens-before the first emission.
    ctx.lifecycle
        .subscribe("startup", SubscriptionMode::Once, Arc::new(StartupLogger))
        .await;
    if let Some(base_url) = cfg.api_base_url.as_deref() {
        let client = InternalApiClient::new(base_url, ctx.rotator.clone());
        ctx.lifecycle
            .subscribe(
                "startup",
                SubscriptionMode::Once,
                Arc::new(StartupAnnouncer { client }),
            )
            .await;
    }

    let startup = ctx
        .lifecycle
        .emit(
            "startup",
            json!({"agent_id": cfg.agent_id, "version": crate::VERSION}),
        )
        .await;
    for task in startup {
        let _ = task.await;
    }

    crate::comms::local_api::serve(ctx, cfg.port).await
}
