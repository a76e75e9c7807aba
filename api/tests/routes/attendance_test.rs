use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{
    get_request, json_request, make_test_app, presenter_bearer, read_json, student_bearer,
};

const STUDENT_ID: i64 = 42;

/// Opens a session over HTTP and returns (session_id, live token).
async fn open_session_with_token(app: &axum::Router, presenter: &str) -> (i64, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            Some(presenter),
            json!({ "subject_id": 10, "course_ids": [100], "semester": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/sessions/{id}/token"), Some(presenter)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let minted = read_json(response).await;
    let token = minted["data"]["token"].as_str().unwrap().to_owned();

    (id, token)
}

async fn check_in(app: &axum::Router, student: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/check-in",
            Some(student),
            json!({ "token": token }),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

async fn end_session(app: &axum::Router, presenter: &str, session_id: i64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{session_id}/end"),
            Some(presenter),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn check_in_records_presence_and_counters() {
    let (app, db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (session_id, token) = open_session_with_token(&app, &presenter).await;

    let (status, json) = check_in(&app, &student, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Attendance recorded");

    // visible to the presenter
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/sessions/{session_id}/attendees"),
            Some(&presenter),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["attendees"], json!([STUDENT_ID]));

    // counters were bumped in the same transaction
    let totals = db::models::attendance_total::Model::get(&db, STUDENT_ID, 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(totals.attended_count, 1);
    assert_eq!(totals.total_count, 1);
}

#[tokio::test]
#[serial]
async fn duplicate_check_in_is_rejected() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (_, token) = open_session_with_token(&app, &presenter).await;

    let (status, _) = check_in(&app, &student, &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = check_in(&app, &student, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Attendance already recorded for this session");
}

#[tokio::test]
#[serial]
async fn malformed_token_is_rejected() {
    let (app, _db) = make_test_app().await;
    let student = student_bearer(STUDENT_ID);

    let (status, json) = check_in(&app, &student, "not-a-token").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid code format");
}

#[tokio::test]
#[serial]
async fn stale_token_is_rejected_as_expired() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (session_id, _) = open_session_with_token(&app, &presenter).await;

    let stale_ms = Utc::now().timestamp_millis() - db::token::VALIDITY_MS - 1_000;
    let stale = format!("{session_id}:{stale_ms}");

    let (status, json) = check_in(&app, &student, &stale).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Code has expired, scan the live code");
}

#[tokio::test]
#[serial]
async fn token_for_unknown_session_is_not_found() {
    let (app, _db) = make_test_app().await;
    let student = student_bearer(STUDENT_ID);

    let fresh = format!("999999:{}", Utc::now().timestamp_millis());
    let (status, json) = check_in(&app, &student, &fresh).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Session not found");
}

#[tokio::test]
#[serial]
async fn check_in_after_end_is_rejected() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (session_id, _) = open_session_with_token(&app, &presenter).await;
    end_session(&app, &presenter, session_id).await;

    // even a token that is still inside its validity window
    let live = format!("{session_id}:{}", Utc::now().timestamp_millis());
    let (status, json) = check_in(&app, &student, &live).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "This session is no longer active");
}

#[tokio::test]
#[serial]
async fn attendance_routes_require_student_role() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/check-in",
            Some(&presenter),
            json!({ "token": "1:1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_request("/api/attendance/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn reconcile_backfills_missed_sessions_once() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (session_id, _) = open_session_with_token(&app, &presenter).await;
    end_session(&app, &presenter, session_id).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/reconcile",
            Some(&student),
            json!({ "course_id": 100, "semester": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["resolved"], 1);

    // an immediate re-run resolves nothing
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/reconcile",
            Some(&student),
            json!({ "course_id": 100, "semester": 3 }),
        ))
        .await
        .unwrap();
    let json = read_json(response).await;
    assert_eq!(json["data"]["resolved"], 0);

    // the miss shows up in the stats as a non-attended session
    let response = app
        .oneshot(get_request("/api/attendance/stats", Some(&student)))
        .await
        .unwrap();
    let json = read_json(response).await;
    assert_eq!(json["data"]["attended"], 0);
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["percentage"], 0.0);
}

#[tokio::test]
#[serial]
async fn reconcile_skips_sessions_already_attended() {
    let (app, _db) = make_test_app().await;
    let presenter = presenter_bearer(1);
    let student = student_bearer(STUDENT_ID);

    let (session_id, token) = open_session_with_token(&app, &presenter).await;
    let (status, _) = check_in(&app, &student, &token).await;
    assert_eq!(status, StatusCode::OK);
    end_session(&app, &presenter, session_id).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/reconcile",
            Some(&student),
            json!({ "course_id": 100, "semester": 3 }),
        ))
        .await
        .unwrap();
    let json = read_json(response).await;
    assert_eq!(json["data"]["resolved"], 0);

    let response = app
        .oneshot(get_request("/api/attendance/stats", Some(&student)))
        .await
        .unwrap();
    let json = read_json(response).await;
    assert_eq!(json["data"]["attended"], 1);
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["percentage"], 100.0);
}

#[tokio::test]
#[serial]
async fn stats_start_empty() {
    let (app, _db) = make_test_app().await;
    let student = student_bearer(STUDENT_ID);

    let response = app
        .oneshot(get_request("/api/attendance/stats", Some(&student)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["data"]["subjects"], json!([]));
    assert_eq!(json["data"]["attended"], 0);
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["percentage"], 0.0);
}
