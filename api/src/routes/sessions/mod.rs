//! Presenter-facing session routes.
//!
//! Routes:
//! - `POST   /`                         → open a session
//! - `GET    /`                         → list the presenter's active sessions
//! - `GET    /{session_id}`             → fetch one session
//! - `POST   /{session_id}/end`         → end a session (idempotent)
//! - `GET    /{session_id}/token`       → mint the current QR payload
//! - `GET    /{session_id}/attendees`   → students recorded present

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod common;
pub mod get;
pub mod post;

use get::{get_session, get_session_token, list_active_sessions, list_attendees};
use post::{create_session, end_session};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_active_sessions))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/end", post(end_session))
        .route("/{session_id}/token", get(get_session_token))
        .route("/{session_id}/attendees", get(list_attendees))
}
