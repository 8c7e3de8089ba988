use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::constants::{DEFAULT_PAGE, DEFAULT_RANDOM_COUNT};
use crate::extractors::JsonBody;
use crate::response::{created, ok, paginated, AppError};
use crate::state::AppState;
use crate::store::operations::questions::{NewQuestion, VerbForm, VerbType};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/count", get(count_questions))
        .route("/random", get(random_questions))
        .route("/bulk", post(bulk_insert))
        .route("/search", get(search_questions))
        .route("/:id", get(get_question))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuestionsQuery {
    form: VerbForm,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_questions(
    Query(query): Query<ListQuestionsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = &state.config().pagination;
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query
        .limit
        .unwrap_or(pagination.default_page_size)
        .min(pagination.max_page_size);

    let items = state.store().get_questions_paginated(query.form, page, limit)?;
    let total = state.store().count_questions_by_form(query.form)?;
    Ok(paginated(items, total as u64, page as u64, limit as u64))
}

async fn create_question(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewQuestion>,
) -> Result<impl IntoResponse, AppError> {
    let question = state.store().add_question(&req)?;
    Ok(created(question))
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    form: Option<VerbForm>,
}

async fn count_questions(
    Query(query): Query<CountQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let total = match query.form {
        Some(form) => state.store().count_questions_by_form(form)?,
        None => state.store().count_questions(),
    };
    Ok(ok(serde_json::json!({ "total": total })))
}

#[derive(Debug, Deserialize)]
struct RandomQuery {
    form: VerbForm,
    count: Option<usize>,
}

async fn random_questions(
    Query(query): Query<RandomQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let count = query
        .count
        .unwrap_or(DEFAULT_RANDOM_COUNT)
        .min(state.config().pagination.max_page_size);
    let items = state.store().get_random_questions(query.form, count)?;
    Ok(ok(items))
}

#[derive(Debug, Deserialize)]
struct BulkInsertRequest {
    questions: Vec<NewQuestion>,
}

async fn bulk_insert(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BulkInsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ids = state.store().bulk_insert_questions(req.questions)?;
    Ok(created(serde_json::json!({ "inserted": ids.len(), "ids": ids })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    verb_type: Option<VerbType>,
    category: Option<String>,
    difficulty: Option<u8>,
}

/// Exactly one secondary-index filter per call.
async fn search_questions(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = match (query.verb_type, query.category.as_deref(), query.difficulty) {
        (Some(verb_type), None, None) => state.store().questions_by_verb_type(verb_type)?,
        (None, Some(category), None) => state.store().questions_by_category(category)?,
        (None, None, Some(difficulty)) => state.store().questions_by_difficulty(difficulty)?,
        _ => {
            return Err(AppError::bad_request(
                "INVALID_FILTER",
                "Provide exactly one of verbType, category or difficulty",
            ))
        }
    };
    Ok(ok(items))
}

async fn get_question(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .store()
        .get_question(id)?
        .ok_or_else(|| AppError::not_found("Question not found"))?;
    Ok(ok(question))
}
