use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A subscriber to a named lifecycle event.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    async fn handle(&self, payload: &Value) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// Unsubscribed after its first invocation, success or failure.
    Once,
    /// Runs on every emission of the event.
    Repeating,
}

struct Subscription {
    mode: SubscriptionMode,
    handler: Arc<dyn LifecycleHandler>,
}

/// Fans named lifecycle events out to their subscribers.
///
/// Subscription is a startup activity: all subscribers attach before the
/// first emission. Each subscriber runs in its own task and a failure is
/// logged with the event name, never surfaced to other subscribers or to
/// future emissions.
#[derive(Clone, Default)]
pub struct LifecycleDispatcher {
    subscriptions: Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
}

impl LifecycleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(
        &self,
        event: &str,
        mode: SubscriptionMode,
        handler: Arc<dyn LifecycleHandler>,
    ) {
        let mut subs = self.subscriptions.write().await;
        subs.entry(event.to_string())
            .or_default()
            .push(Subscription { mode, handler });
    }

    pub async fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Invoke every subscriber of `event` with `payload`.
    ///
    /// `Once` subscriptions leave the registry under the lock, before their
    /// handler runs, so two back-to-back emissions run them exactly once
    /// between them. Returns the spawned task handles so callers that need
    /// completion (startup, tests) can await them.
    pub async fn emit(&self, event: &str, payload: Value) -> Vec<JoinHandle<()>> {
        let to_run: Vec<Arc<dyn LifecycleHandler>> = {
            let mut subs = self.subscriptions.write().await;
            match subs.get_mut(event) {
                Some(list) => {
                    let snapshot = list.iter().map(|s| Arc::clone(&s.handler)).collect();
                    list.retain(|s| s.mode == SubscriptionMode::Repeating);
                    snapshot
                }
                None => {
                    debug!(event = %event, "emitted with no subscribers");
                    return Vec::new();
                }
            }
        };

        to_run
            .into_iter()
            .map(|handler| {
                let event = event.to_string();
                let payload = payload.clone();
                tokio::spawn(async move {
                    if let Err(err) = handler.handle(&payload).await {
                        warn!(event = %event, error = %err, "lifecycle handler failed");
                    }
                })
            })
            .collect()
    }
}
