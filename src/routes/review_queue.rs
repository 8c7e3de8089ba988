use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::review_queue::ReviewQueueItem;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(enqueue))
        .route("/due", get(due))
        .route("/:id", delete(remove))
}

async fn enqueue(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReviewQueueItem>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(state.store().enqueue_review(&req)?))
}

#[derive(Debug, Deserialize)]
struct DueQuery {
    now: Option<DateTime<Utc>>,
    limit: Option<usize>,
}

async fn due(
    Query(query): Query<DueQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let now = query.now.unwrap_or_else(Utc::now);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(state.config().pagination.max_page_size);
    Ok(ok(state.store().due_reviews(now, limit)?))
}

async fn remove(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().remove_review(id)?))
}
