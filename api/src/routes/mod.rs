//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/sessions` → Session lifecycle, token minting and attendee listing
//!   (presenter-only)
//! - `/attendance` → Check-in, absentee reconciliation and personal stats
//!   (student-only)

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::{require_presenter, require_student};

pub mod attendance;
pub mod health;
pub mod sessions;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest(
            "/sessions",
            sessions::session_routes().route_layer(from_fn(require_presenter)),
        )
        .nest(
            "/attendance",
            attendance::attendance_routes().route_layer(from_fn(require_student)),
        )
        .with_state(app_state)
}
