//! Agent HTTP API
//!
//! - `GET /ping`: liveness
//! - `GET /v1/status`: supervisor state and current leader
//! - `GET /v1/resolver/records`: records served by the local resolver
//! - `GET /v1/gateway/upstreams`: backends registered with the local gateway

use crate::agent::supervisor::SupervisorState;
use crate::common::{Error, Result};
use crate::gateway::Gateway;
use crate::resolver::Resolver;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ApiState {
    pub supervisor: watch::Receiver<SupervisorState>,
    pub resolver: Arc<Resolver>,
    pub gateway: Arc<Gateway>,
    pub started_at: DateTime<Utc>,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/v1/status", get(status))
        .route("/v1/resolver/records", get(resolver_records))
        .route("/v1/gateway/upstreams", get(gateway_upstreams))
        .with_state(state)
}

async fn ping() -> &'static str {
    "pong"
}

async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    let supervisor = state.supervisor.borrow().clone();
    Json(json!({
        "version": crate::VERSION,
        "started_at": state.started_at,
        "state": supervisor.label(),
        "leader": supervisor.leader(),
    }))
}

async fn resolver_records(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "records": state.resolver.records(),
        "proxies": state.resolver.proxies(),
    }))
}

async fn gateway_upstreams(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({ "upstreams": state.gateway.upstreams() }))
}

/// Bind `addr` and serve until `cancel` fires. A bind failure is a startup error.
pub async fn serve(addr: SocketAddr, state: ApiState, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::startup("http api", format!("bind {}: {}", addr, e)))?;

    tracing::info!("✓ HTTP API listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
