use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;

use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::questions::VerbForm;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/recompute", post(recompute))
        .route("/:form", get(for_form))
}

async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().get_statistics_summary()?))
}

async fn recompute(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = state.store().recompute_statistics(Utc::now())?;
    Ok(ok(rows))
}

async fn for_form(
    Path(form): Path<VerbForm>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state
        .store()
        .statistics_for_form(form)?
        .ok_or_else(|| AppError::not_found("No statistics for form"))?;
    Ok(ok(stats))
}
