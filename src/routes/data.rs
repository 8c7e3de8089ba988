use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export", get(export))
        .route("/import", post(import))
        .route("/", delete(clear_all))
}

async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().export_data()?))
}

/// Takes the body as raw JSON so shape problems surface as `MALFORMED_SNAPSHOT`.
async fn import(
    State(state): State<AppState>,
    JsonBody(raw): JsonBody<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().import_data_json(&raw)?))
}

async fn clear_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().clear_all_data()?))
}
