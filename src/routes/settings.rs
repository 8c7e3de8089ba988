use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::settings::UserSettings;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(save_settings))
}

async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().get_user_settings()?))
}

async fn save_settings(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserSettings>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().save_user_settings(&req)?))
}
