use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::wrong_answers::WrongAnswer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_progress))
        .route("/answers", post(record_answer))
        .route("/due", get(due_progress))
        .route("/question/:question_id", get(progress_for_question))
}

async fn list_progress(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store().list_progress()?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordAnswerRequest {
    question_id: u64,
    correct: bool,
    user_answer: Option<String>,
    answered_at: Option<DateTime<Utc>>,
}

/// Updates progress; a wrong answer with `userAnswer` also lands in the wrong-answer log.
async fn record_answer(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let answered_at = req.answered_at.unwrap_or_else(Utc::now);
    let progress = state
        .store()
        .record_answer(req.question_id, req.correct, answered_at)?;

    if !req.correct {
        if let (Some(user_answer), Some(question)) =
            (req.user_answer, state.store().get_question(req.question_id)?)
        {
            state.store().save_wrong_answer(&WrongAnswer {
                question_id: req.question_id,
                form: question.form,
                user_answer,
                correct_answer: question.casual,
                recorded_at: answered_at,
            })?;
        }
    }

    Ok(ok(progress))
}

#[derive(Debug, Deserialize)]
struct DueQuery {
    before: Option<DateTime<Utc>>,
}

async fn due_progress(
    Query(query): Query<DueQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let now = query.before.unwrap_or_else(Utc::now);
    Ok(ok(state.store().progress_due_before(now)?))
}

async fn progress_for_question(
    Path(question_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .store()
        .progress_for_question(question_id)?
        .ok_or_else(|| AppError::not_found("No progress for question"))?;
    Ok(ok(progress))
}
