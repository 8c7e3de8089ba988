use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::app_state::AppPreferences;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(load).put(save))
}

async fn load(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().load_app_preferences()?))
}

async fn save(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AppPreferences>,
) -> Result<impl IntoResponse, AppError> {
    state.store().save_app_preferences(&req)?;
    Ok(ok(req))
}
