use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use command_relay::agent::{AgentContext, Config};
use command_relay::commands::{builtin, HandlerRegistry};
use command_relay::comms::local_api::create_router;
use command_relay::security::rotator::SECRET_ENV;
use command_relay::security::{CredentialRotator, TOKEN_HEADER};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, OnceLock};
use tower::ServiceExt; // for Router::oneshot

static TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
fn lock_tests() -> std::sync::MutexGuard<'static, ()> {
    match TEST_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(g) => g,
        Err(e) => e.into_inner(),
    }
}

fn test_router() -> Router {
    let cfg = Arc::new(Config {
        agent_id: "test-agent".to_string(),
        api_base_url: None,
        port: 0,
    });
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(builtin::Ping));
    registry.register(Arc::new(builtin::Echo));
    create_router(Arc::new(AgentContext::new(cfg, registry)))
}

/// A token an independent issuer would attach right now. Exercises the
/// no-coordination contract: issuer and verifier share only the clock and
/// the secret.
async fn issuer_token() -> String {
    CredentialRotator::new()
        .current()
        .await
        .expect("secret set by test")
        .current
}

async fn post_command(
    app: &Router,
    name: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/commands/{name}"))
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header(TOKEN_HEADER, token);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn healthz_is_open() {
    let _g = lock_tests();
    let app = test_router();

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn independently_issued_token_authorizes() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let app = test_router();

    let token = issuer_token().await;
    let (status, body) = post_command(&app, "ping", Some(&token), json!({})).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn bogus_token_gets_generic_rejection() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let app = test_router();

    let (status, body) =
        post_command(&app, "ping", Some("not-a-real-token"), json!({})).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // No diagnostic detail beyond the generic marker.
    assert_eq!(body, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn missing_token_header_is_rejected() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let app = test_router();

    let (status, _body) = post_command(&app, "ping", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_secret_rejects_all_callers() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let token = issuer_token().await;

    std::env::remove_var(SECRET_ENV);
    let app = test_router();

    let (status, _body) = post_command(&app, "ping", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_command_is_accepted_and_ignored() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let app = test_router();

    let token = issuer_token().await;
    let (status, body) =
        post_command(&app, "definitely-not-registered", Some(&token), json!({})).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn request_id_is_echoed_when_provided() {
    let _g = lock_tests();
    std::env::set_var(SECRET_ENV, "shared-secret");
    let app = test_router();

    let token = issuer_token().await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/commands/ping")
                .header("content-type", "application/json")
                .header(TOKEN_HEADER, &token)
                .header("X-Request-Id", "req-42")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["request_id"], "req-42");
}
