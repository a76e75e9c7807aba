use axum::{
    Router,
    body::{Body, to_bytes},
    http::Request,
    response::Response,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;

use api::auth::{Role, generate_jwt};
use api::routes::routes;
use db::test_utils::setup_test_db;
use util::state::AppState;

/// Builds a router over a fresh in-memory database, plus a handle to that
/// database for direct assertions. Each call starts from a clean slate.
pub async fn make_test_app() -> (Router, DatabaseConnection) {
    // SAFETY: integration tests are serialized with #[serial], so nothing
    // reads these variables concurrently.
    unsafe {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
        std::env::set_var("JWT_DURATION_MINUTES", "60");
    }

    let db = setup_test_db().await;
    let state = AppState::new(db.clone());

    let router = Router::new().nest("/api", routes(state));
    (router, db)
}

pub fn presenter_bearer(user_id: i64) -> String {
    let (token, _) = generate_jwt(user_id, Role::Presenter);
    format!("Bearer {token}")
}

pub fn student_bearer(user_id: i64) -> String {
    let (token, _) = generate_jwt(user_id, Role::Student);
    format!("Bearer {token}")
}

pub fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn read_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
