//! Health, status and service description handlers

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub started_at: Arc<Instant>,
    /// `firebase`, `memory`, or `unavailable` when startup could not build
    /// the providers.
    pub provider: String,
    pub base_url: String,
}

impl HealthState {
    fn provider_ready(&self) -> bool {
        self.provider != "unavailable"
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub provider: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    /// Seconds since startup.
    pub uptime: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub base_url: String,
    pub provider: String,
    pub endpoints: BTreeMap<String, String>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let status = if state.provider_ready() { "ok" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        provider: state.provider.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "Health",
    responses((status = 200, description = "Legacy status probe", body = StatusResponse))
)]
pub async fn legacy_status(State(state): State<HealthState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online".to_string(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service description", body = ServiceInfo))
)]
pub async fn service_info(State(state): State<HealthState>) -> Json<ServiceInfo> {
    let endpoints = [
        ("health", "GET /api/health"),
        ("register", "POST /api/auth/register"),
        ("lookupProfile", "POST /api/auth/user/{username}"),
        ("deleteAccount", "DELETE /api/auth/user"),
        ("listUsers", "GET|POST /api/admin/users"),
        ("countUsers", "GET|POST /api/admin/users/count"),
        ("setAdmin", "POST /api/admin/set-admin"),
        ("disableUser", "POST /api/admin/user/disable"),
        ("updateUser", "POST /api/admin/user/update"),
        ("deleteUser", "DELETE /api/admin/user"),
        ("docs", "GET /docs"),
        ("metrics", "GET /metrics"),
    ]
    .into_iter()
    .map(|(name, route)| (name.to_string(), route.to_string()))
    .collect();

    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        base_url: state.base_url.clone(),
        provider: state.provider.clone(),
        endpoints,
    })
}
