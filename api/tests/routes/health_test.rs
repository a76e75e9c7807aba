use axum::http::StatusCode;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{get_request, make_test_app, read_json};

#[tokio::test]
#[serial]
async fn health_check_returns_ok_json() {
    let (app, _db) = make_test_app().await;

    let response = app.oneshot(get_request("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
    assert_eq!(json["message"], "Health check passed");
}
