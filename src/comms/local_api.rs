use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::agent::context::AgentContext;
use crate::commands::NullReply;
use crate::security::TOKEN_HEADER;

type SharedState = Arc<AgentContext>;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/commands/{name}", post(execute_command))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": crate::VERSION}))
}

/// Authorize, then hand the invocation to the dispatcher.
///
/// An invalid or absent token gets a generic 401 with no hint of why.
/// Authorized calls are accepted regardless of whether a handler exists for
/// the name; unrecognized commands are tolerated as a no-op.
async fn execute_command(
    State(ctx): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let request_id = headers
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !ctx.rotator.validate(token).await {
        ctx.audit.auth_failure(&name, &request_id);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized"})),
        );
    }
    ctx.audit.auth_success(&name, &request_id);

    let input = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));
    ctx.dispatcher.dispatch(&name, input, Arc::new(NullReply));

    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "accepted", "request_id": request_id})),
    )
}

pub async fn serve(state: SharedState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("binding local API listener")?;
    info!(addr = %addr, "local API listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("serving local API")
}
