mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::spawn_test_app;
use common::fixtures::seed_mixed_questions;
use common::http::{assert_json_error, assert_status_ok_json, get_json, send_json};

#[tokio::test]
async fn it_wrong_answer_updates_progress_and_log() {
    let app = spawn_test_app().await;
    seed_mixed_questions(app.state.store());

    let (status, body) = send_json(
        &app.app,
        Method::POST,
        "/api/progress/answers",
        json!({ "questionId": 1, "correct": false, "userAnswer": "書きて" }),
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["attempts"], 1);
    assert_eq!(body["data"]["streak"], 0);
    assert_eq!(body["data"]["correct"], false);

    let (_, log) = get_json(&app.app, "/api/wrong-answers").await;
    let entries = log["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["correct_answer"], "書いて");
    assert_eq!(entries[0]["form"], "te");

    let (status, cleared) = send_json(&app.app, Method::DELETE, "/api/wrong-answers", json!({})).await;
    assert_status_ok_json(status, &cleared);
    assert_eq!(cleared["data"]["removed"], 1);
}

#[tokio::test]
async fn it_correct_answers_build_a_streak() {
    let app = spawn_test_app().await;
    seed_mixed_questions(app.state.store());

    for _ in 0..2 {
        send_json(
            &app.app,
            Method::POST,
            "/api/progress/answers",
            json!({ "questionId": 4, "correct": true }),
        )
        .await;
    }

    let (status, body) = get_json(&app.app, "/api/progress/question/4").await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["attempts"], 2);
    assert_eq!(body["data"]["streak"], 2);

    let (status, missing) = get_json(&app.app, "/api/progress/question/5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&missing, "NOT_FOUND");
}

#[tokio::test]
async fn it_statistics_recompute_and_summary() {
    let app = spawn_test_app().await;
    seed_mixed_questions(app.state.store());
    send_json(
        &app.app,
        Method::POST,
        "/api/progress/answers",
        json!({ "questionId": 1, "correct": true }),
    )
    .await;

    let (status, rows) = send_json(&app.app, Method::POST, "/api/statistics/recompute", json!({})).await;
    assert_status_ok_json(status, &rows);
    assert_eq!(rows["data"].as_array().unwrap().len(), 4);

    let (_, te) = get_json(&app.app, "/api/statistics/te").await;
    assert_eq!(te["data"]["total_questions"], 3);
    assert_eq!(te["data"]["correct_answers"], 1);
    assert_eq!(te["data"]["accuracy_rate"], 1.0);

    let (_, summary) = get_json(&app.app, "/api/statistics").await;
    assert_eq!(summary["data"]["total_questions"], 5);
    assert_eq!(summary["data"]["total_progress"], 1);
    assert_eq!(summary["data"]["statistics"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn it_settings_default_then_saved() {
    let app = spawn_test_app().await;

    let (_, defaults) = get_json(&app.app, "/api/settings").await;
    assert_eq!(defaults["data"]["theme"], "light");
    assert_eq!(defaults["data"]["daily_goal"], 20);

    let (status, saved) = send_json(
        &app.app,
        Method::PUT,
        "/api/settings",
        json!({
            "theme": "dark",
            "language": "ja",
            "daily_goal": 30,
            "notifications": false,
            "spaced_repetition": true,
        }),
    )
    .await;
    assert_status_ok_json(status, &saved);
    assert_eq!(saved["data"]["id"], 1);

    let (_, current) = get_json(&app.app, "/api/settings").await;
    assert_eq!(current["data"]["theme"], "dark");
    assert_eq!(current["data"]["daily_goal"], 30);
}

#[tokio::test]
async fn it_settings_require_every_field() {
    let app = spawn_test_app().await;

    let (status, body) = send_json(&app.app, Method::PUT, "/api/settings", json!({ "theme": "dark" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn it_grammar_rules_filter_by_form() {
    let app = spawn_test_app().await;
    app.state.store().seed_grammar_rules_if_empty().unwrap();

    let (_, all) = get_json(&app.app, "/api/grammar-rules").await;
    assert_eq!(all["data"].as_array().unwrap().len(), 4);

    let (_, te) = get_json(&app.app, "/api/grammar-rules?form=te").await;
    let rules = te["data"].as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["form"], "te");
}

#[tokio::test]
async fn it_review_queue_lifecycle() {
    let app = spawn_test_app().await;

    let (status, created) = send_json(
        &app.app,
        Method::POST,
        "/api/review-queue",
        json!({
            "question_id": 42,
            "priority": 3,
            "due_date": "2020-01-01T00:00:00Z",
            "review_count": 0,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_u64().unwrap();

    let (_, due) = get_json(&app.app, "/api/review-queue/due").await;
    assert_eq!(due["data"].as_array().unwrap().len(), 1);

    let path = format!("/api/review-queue/{id}");
    let (status, _) = send_json(&app.app, Method::DELETE, &path, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app.app, Method::DELETE, &path, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn it_app_state_round_trips() {
    let app = spawn_test_app().await;

    let (_, defaults) = get_json(&app.app, "/api/app-state").await;
    assert_eq!(defaults["data"], json!({ "theme": "light", "currentPage": "home" }));

    let (status, _) = send_json(
        &app.app,
        Method::PUT,
        "/api/app-state",
        json!({ "theme": "dark", "currentPage": "review" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, stored) = get_json(&app.app, "/api/app-state").await;
    assert_eq!(stored["data"]["currentPage"], "review");
}
