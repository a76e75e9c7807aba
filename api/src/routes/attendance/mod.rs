//! Student-facing attendance routes.
//!
//! Routes:
//! - `POST /check-in`  → record presence from a scanned code
//! - `POST /reconcile` → back-fill absent outcomes for ended sessions
//! - `GET  /stats`     → per-subject attendance counters

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod common;
pub mod get;
pub mod post;

use get::my_stats;
use post::{check_in, reconcile};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/reconcile", post(reconcile))
        .route("/stats", get(my_stats))
}
