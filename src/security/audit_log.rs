use tracing::{info, warn};

/// Structured audit trail for the authorization and dispatch boundary.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn auth_success(&self, command: &str, request_id: &str) {
        info!(target: "audit", event = "auth_success", command, request_id);
    }

    pub fn auth_failure(&self, command: &str, request_id: &str) {
        warn!(target: "audit", event = "auth_failure", command, request_id);
    }

    pub fn missing_secret(&self) {
        warn!(target: "audit", event = "missing_secret", env = super::rotator::SECRET_ENV);
    }

    pub fn handler_failed(&self, handler: &str, error_msg: &str) {
        warn!(target: "audit", event = "handler_failed", handler, error = error_msg);
    }

    pub fn notify_failed(&self, handler: &str, error_msg: &str) {
        warn!(target: "audit", event = "notify_failed", handler, error = error_msg);
    }
}
