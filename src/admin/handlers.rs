use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::cache::{CacheConnectionState, HealthSnapshot, HealthStatus};
use crate::environment::{CacheTier, DeploymentMode, Endpoint, ExecutionMode, Plugin};
use crate::lifecycle::Connectivity;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct TargetStatus {
    pub deployment_mode: DeploymentMode,
    pub execution_mode: ExecutionMode,
    pub endpoint: Endpoint,
    pub address: String,
    pub plugins: Vec<Plugin>,
    pub cache_tiers: Vec<CacheTier>,
    pub cache_connection: Option<CacheConnectionState>,
}

pub async fn get_health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Memoized cache health; 503 only when a configured cache is unreachable.
pub async fn get_cache_health(
    State(connectivity): State<Connectivity>,
) -> (StatusCode, Json<HealthSnapshot>) {
    let snapshot = connectivity.check_connectivity().await;
    let code = match snapshot.status {
        HealthStatus::Connected | HealthStatus::NotConfigured => StatusCode::OK,
        HealthStatus::Unreachable | HealthStatus::TimedOut => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(snapshot))
}

pub async fn get_status(State(connectivity): State<Connectivity>) -> Json<TargetStatus> {
    let target = connectivity.execution_target();
    Json(TargetStatus {
        deployment_mode: connectivity.deployment_mode(),
        execution_mode: target.mode(),
        endpoint: target.endpoint().clone(),
        address: connectivity.identity().address().to_string(),
        plugins: target.plugins().to_vec(),
        cache_tiers: target.cache_strategy().tiers().to_vec(),
        cache_connection: connectivity.cache_handle().map(|h| h.state()),
    })
}
