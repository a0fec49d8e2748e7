use std::sync::Arc;

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Environment variable holding the long-lived agent secret.
pub const SECRET_ENV: &str = "RELAY_SECRET";

/// Seconds a derived credential pair stays the primary token.
const WINDOW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("agent secret is not configured (RELAY_SECRET unset)")]
    MissingSecret,
}

/// Time-windowed credential pair derived from the secret and the wall clock.
///
/// At any instant at most two hashes are accepted: the one for the current
/// minute and the one for the minute before it, so a token generated at
/// second 59 still validates a few seconds into the next window.
#[derive(Debug, Clone)]
pub struct RotatingCredential {
    pub current: String,
    pub previous: String,
    pub expires_at: DateTime<Utc>,
}

impl RotatingCredential {
    /// Exact, constant-time match against either slot.
    pub fn matches(&self, token: &str) -> bool {
        let token = token.as_bytes();
        let cur: bool = token.ct_eq(self.current.as_bytes()).into();
        let prev: bool = token.ct_eq(self.previous.as_bytes()).into();
        cur | prev
    }
}

/// SHA-256(secret + day + hour + minute), base64-encoded.
///
/// Components are unpadded decimal, all taken from the same instant. The
/// previous-window hash is derived by shifting the instant back a full
/// minute, so a wrap at minute 0 rolls the hour (and day) consistently
/// instead of decrementing the minute field in isolation.
fn window_hash(secret: &str, at: DateTime<Utc>) -> String {
    let message = format!("{}{}{}{}", secret, at.day(), at.hour(), at.minute());
    let digest = Sha256::digest(message.as_bytes());
    general_purpose::STANDARD.encode(digest)
}

/// Derives and validates short-lived credentials without any coordination
/// beyond the clock: an issuer and a verifier running this logic
/// independently agree on validity.
///
/// The cached pair is replaced wholesale under the write lock, never mutated
/// field by field, so readers only ever observe a complete credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialRotator {
    cache: Arc<RwLock<Option<RotatingCredential>>>,
}

impl CredentialRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current credential pair, recomputed lazily once the window elapses.
    pub async fn current(&self) -> Result<RotatingCredential, CredentialError> {
        self.current_at(Utc::now()).await
    }

    pub async fn current_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RotatingCredential, CredentialError> {
        if let Some(cred) = self.cache.read().await.as_ref() {
            if cred.expires_at > now {
                return Ok(cred.clone());
            }
        }

        let secret = std::env::var(SECRET_ENV).map_err(|_| CredentialError::MissingSecret)?;
        let fresh = RotatingCredential {
            current: window_hash(&secret, now),
            previous: window_hash(&secret, now - Duration::seconds(WINDOW_SECS)),
            expires_at: now + Duration::seconds(WINDOW_SECS),
        };

        let mut guard = self.cache.write().await;
        // A concurrent caller may have published while we derived; keep the
        // pair that is still live.
        if let Some(existing) = guard.as_ref() {
            if existing.expires_at > now {
                return Ok(existing.clone());
            }
        }
        info!(target: "audit", event = "credential_rotated", expires_at = %fresh.expires_at);
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// True iff `token` matches the up-to-date `current` or `previous` hash.
    ///
    /// A missing secret rejects unconditionally: misconfiguration must not
    /// crash the caller, but it gets its own signal in the logs since the
    /// fault is ours, not the caller's.
    pub async fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.current_at(now).await {
            Ok(cred) => cred.matches(token),
            Err(CredentialError::MissingSecret) => {
                warn!(
                    env = SECRET_ENV,
                    "credential validation rejected: secret not configured"
                );
                false
            }
        }
    }
}
