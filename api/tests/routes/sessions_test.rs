use axum::http::StatusCode;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{get_request, json_request, make_test_app, presenter_bearer, student_bearer};
use crate::helpers::read_json;

async fn create_session(
    app: &axum::Router,
    auth: &str,
    course_ids: Value,
    semester: i32,
) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            Some(auth),
            json!({ "subject_id": 10, "course_ids": course_ids, "semester": semester }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
#[serial]
async fn create_session_returns_active_session() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let json = create_session(&app, &auth, json!([100, 101]), 3).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Attendance session created");
    assert_eq!(json["data"]["presenter_id"], 1);
    assert_eq!(json["data"]["status"], "active");
    assert_eq!(json["data"]["course_ids"], json!([100, 101]));
    assert!(json["data"]["ended_at"].is_null());
}

#[tokio::test]
#[serial]
async fn create_session_rejects_empty_courses() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            Some(&auth),
            json!({ "subject_id": 10, "course_ids": [], "semester": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = read_json(response).await;
    assert_eq!(json["success"], false);
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("At least one course is required")
    );
}

#[tokio::test]
#[serial]
async fn session_routes_require_presenter_role() {
    let (app, _db) = make_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            None,
            json!({ "subject_id": 10, "course_ids": [100], "semester": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let student = student_bearer(2);
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/sessions",
            Some(&student),
            json!({ "subject_id": 10, "course_ids": [100], "semester": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn end_session_is_idempotent_over_http() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let created = create_session(&app, &auth, json!([100]), 3).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{id}/end"),
            Some(&auth),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = read_json(response).await;
    assert_eq!(first["data"]["status"], "ended");
    let ended_at = first["data"]["ended_at"].clone();
    assert!(!ended_at.is_null());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{id}/end"),
            Some(&auth),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = read_json(response).await;
    assert_eq!(second["data"]["ended_at"], ended_at);
}

#[tokio::test]
#[serial]
async fn end_unknown_session_is_not_found() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/sessions/9999/end",
            Some(&auth),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn list_excludes_ended_and_other_presenters() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);
    let other = presenter_bearer(2);

    let mine = create_session(&app, &auth, json!([100]), 3).await;
    let done = create_session(&app, &auth, json!([100]), 3).await;
    create_session(&app, &other, json!([100]), 3).await;

    let done_id = done["data"]["id"].as_i64().unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{done_id}/end"),
            Some(&auth),
            json!({}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/sessions", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    let sessions = json["data"]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], mine["data"]["id"]);
}

#[tokio::test]
#[serial]
async fn token_endpoint_mints_scannable_payload() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let created = create_session(&app, &auth, json!([100]), 3).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .oneshot(get_request(
            &format!("/api/sessions/{id}/token"),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["data"]["session_id"], id);
    assert_eq!(json["data"]["rotation_ms"], db::token::ROTATION_MS);
    assert_eq!(json["data"]["validity_ms"], db::token::VALIDITY_MS);

    let token = json["data"]["token"].as_str().unwrap();
    let prefix = format!("{id}:");
    assert!(token.starts_with(&prefix));
    assert!(token[prefix.len()..].parse::<i64>().is_ok());
}

#[tokio::test]
#[serial]
async fn token_endpoint_conflicts_once_session_ended() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let created = create_session(&app, &auth, json!([100]), 3).await;
    let id = created["data"]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sessions/{id}/end"),
            Some(&auth),
            json!({}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request(
            &format!("/api/sessions/{id}/token"),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = read_json(response).await;
    assert_eq!(json["message"], "Session is no longer active");
}

#[tokio::test]
#[serial]
async fn token_endpoint_unknown_session_is_not_found() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let response = app
        .oneshot(get_request("/api/sessions/9999/token", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn get_session_round_trips() {
    let (app, _db) = make_test_app().await;
    let auth = presenter_bearer(1);

    let created = create_session(&app, &auth, json!([100, 200]), 3).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .oneshot(get_request(&format!("/api/sessions/{id}"), Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["course_ids"], json!([100, 200]));
}
