use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::wrong_answers::WrongAnswer;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(save).delete(clear))
}

async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().get_wrong_answers()?))
}

async fn save(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<WrongAnswer>,
) -> Result<impl IntoResponse, AppError> {
    state.store().save_wrong_answer(&req)?;
    Ok(created(req))
}

async fn clear(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let removed = state.store().clear_wrong_answers()?;
    Ok(ok(serde_json::json!({ "removed": removed })))
}
