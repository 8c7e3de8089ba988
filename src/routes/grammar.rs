use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::grammar_rules::GrammarRule;
use crate::store::operations::questions::VerbForm;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rules).post(create_rule))
        .route("/:id", get(get_rule))
}

#[derive(Debug, Deserialize)]
struct RulesQuery {
    form: Option<VerbForm>,
}

async fn list_rules(
    Query(query): Query<RulesQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rules = match query.form {
        Some(form) => state.store().grammar_rules_by_form(form)?,
        None => state.store().list_grammar_rules()?,
    };
    Ok(ok(rules))
}

async fn create_rule(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GrammarRule>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(state.store().add_grammar_rule(&req)?))
}

async fn get_rule(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state
        .store()
        .get_grammar_rule(id)?
        .ok_or_else(|| AppError::not_found("Grammar rule not found"))?;
    Ok(ok(rule))
}
