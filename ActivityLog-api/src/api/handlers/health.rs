use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use activity_log_domain::health::{ComponentStatus, HealthService, HealthServiceTrait, SystemStatus};

/// Shared handle to the health service
pub type SharedHealthService = Arc<dyn HealthServiceTrait + Send + Sync>;

/// Health report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", "degraded" or "error"
    #[schema(example = "ok")]
    pub status: String,
    /// Crate version
    pub version: String,
    /// Unix time of the report, in seconds
    pub timestamp: u64,
    /// Seconds since the server started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Status per component; always contains "database" and "api"
    pub components: BTreeMap<String, ComponentHealthStatus>,
    /// Value of APP_ENV
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// "ok", "degraded" or "error"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Record the server start time for uptime reporting. Later calls are ignored.
pub fn initialize_server_start_time() {
    SERVER_START_TIME.get_or_init(now_secs);
}

/// Report the health of the service and its database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = HealthResponse),
        (status = 500, description = "API is not healthy", body = HealthResponse),
        (status = 503, description = "API is degraded", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(Extension(health_service): Extension<SharedHealthService>) -> impl IntoResponse {
    info!("Health check requested");

    let now = now_secs();
    let system_health = health_service.get_system_health().await;

    let (status, label) = match system_health.status {
        SystemStatus::Healthy => (StatusCode::OK, "ok"),
        SystemStatus::Degraded => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
        SystemStatus::Unhealthy => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
    };

    let mut components: BTreeMap<String, ComponentHealthStatus> = system_health
        .components
        .into_iter()
        .map(|(name, component)| {
            let status = component_label(&component.status).to_string();
            (name, ComponentHealthStatus { status, message: component.details })
        })
        .collect();
    for required in ["database", "api"] {
        components.entry(required.to_string()).or_insert_with(|| ComponentHealthStatus {
            status: component_label(&ComponentStatus::Healthy).to_string(),
            message: None,
        });
    }

    let response = HealthResponse {
        status: label.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime: SERVER_START_TIME.get().map(|&start| now.saturating_sub(start)),
        components,
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    };

    (status, Json(response))
}

fn component_label(status: &ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "ok",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "error",
    }
}

/// Health service over the global database pool
pub fn create_health_service() -> SharedHealthService {
    Arc::new(HealthService::new())
}
