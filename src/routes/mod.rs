pub mod app_state;
pub mod data;
pub mod grammar;
pub mod health;
pub mod progress;
pub mod questions;
pub mod review_queue;
pub mod settings;
pub mod statistics;
pub mod wrong_answers;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};

use crate::middleware::request_id;
use crate::response::ErrorBody;
use crate::state::AppState;

/// Maximum request body size: 8 MiB, enough for a full export re-imported.
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/questions", questions::router())
        .nest("/progress", progress::router())
        .nest("/statistics", statistics::router())
        .nest("/grammar-rules", grammar::router())
        .nest("/settings", settings::router())
        .nest("/review-queue", review_queue::router())
        .nest("/wrong-answers", wrong_answers::router())
        .nest("/app-state", app_state::router())
        .nest("/data", data::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback(fallback_404)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            code: "NOT_FOUND".to_string(),
            message: "Not found".to_string(),
            trace_id: None,
        }),
    )
}
