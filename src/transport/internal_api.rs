use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::security::{CredentialRotator, TOKEN_HEADER};

/// Outbound client for the internal API.
///
/// The issuer half of the rotating-credential scheme: each request carries
/// the current window hash, and the verifier on the other end derives the
/// same pair from its own clock. No round-trip or shared store is involved.
#[derive(Clone)]
pub struct InternalApiClient {
    base_url: String,
    rotator: CredentialRotator,
    client: Client,
}

impl InternalApiClient {
    pub fn new(base_url: &str, rotator: CredentialRotator) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            rotator,
            client: Client::new(),
        }
    }

    async fn authed_headers(&self) -> Result<HeaderMap> {
        let cred = self
            .rotator
            .current()
            .await
            .context("deriving relay credential")?;

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_str(&cred.current)?);
        headers.insert(
            "X-Request-Id",
            HeaderValue::from_str(&Uuid::new_v4().to_string())?,
        );
        Ok(headers)
    }

    /// Report a lifecycle event upstream.
    pub async fn post_event(&self, event: &str, payload: &Value) -> Result<()> {
        let url = format!("{}/api/v1/events/{}", self.base_url, event);
        debug!(url = %url, event = %event, "posting lifecycle event");

        let resp = self
            .client
            .post(&url)
            .headers(self.authed_headers().await?)
            .json(payload)
            .send()
            .await
            .context("posting event")?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("event report failed: {}", resp.status()))
        }
    }

    /// Ask a peer relay to run a named command.
    pub async fn run_command(&self, name: &str, payload: &Value) -> Result<()> {
        let url = format!("{}/api/v1/commands/{}", self.base_url, name);
        let resp = self
            .client
            .post(&url)
            .headers(self.authed_headers().await?)
            .json(payload)
            .send()
            .await
            .context("posting command")?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("command submit failed: {}", resp.status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::rotator::SECRET_ENV;
    use crate::utils::testing::lock_env;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn post_event_attaches_rotating_token() {
        let _g = lock_env();
        std::env::set_var(SECRET_ENV, "client-secret");

        let rotator = CredentialRotator::new();
        // A clone shares the cache, so the client sends exactly this token.
        let expected = rotator.current().await.unwrap().current;

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/events/startup")
            .match_header(TOKEN_HEADER, Matcher::Exact(expected))
            .match_body(Matcher::Json(json!({"agent_id": "relay-7"})))
            .with_status(200)
            .create_async()
            .await;

        let client = InternalApiClient::new(&server.url(), rotator.clone());
        client
            .post_event("startup", &json!({"agent_id": "relay-7"}))
            .await
            .expect("post_event should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let _g = lock_env();
        std::env::set_var(SECRET_ENV, "client-secret");

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/commands/ping")
            .with_status(503)
            .create_async()
            .await;

        let client = InternalApiClient::new(&server.url(), CredentialRotator::new());
        let err = client
            .run_command("ping", &json!({}))
            .await
            .expect_err("503 should surface as an error");
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn missing_secret_fails_before_any_request() {
        let _g = lock_env();
        std::env::remove_var(SECRET_ENV);

        let client = InternalApiClient::new("http://127.0.0.1:1", CredentialRotator::new());
        let err = client
            .post_event("startup", &json!({}))
            .await
            .expect_err("no secret, no credential");
        assert!(err.to_string().contains("credential"));
    }
}
