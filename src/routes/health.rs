use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use crate::store::migrate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Mirrors the startup report: schema version plus per-collection counts.
pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let version = migrate::get_current_version(state.store());
    let counts = state.store().collection_counts();
    let latency_us = start.elapsed().as_micros() as u64;

    match version {
        Ok(schema_version) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "healthy": true,
                "schemaVersion": schema_version,
                "counts": counts,
                "latencyUs": latency_us,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "healthy": false,
                    "latencyUs": latency_us,
                })),
            )
        }
    }
}
