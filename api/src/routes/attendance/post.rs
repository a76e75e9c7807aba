use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use validator::Validate;

use crate::{auth::AuthUser, response::ApiResponse};
use common::format_validation_errors;
use db::models::attendance_record::{CheckInOutcome, Model as AttendanceModel};
use util::state::AppState;

use super::common::{CheckInReq, ReconcileReq, ReconcileResponse};

/// POST /api/attendance/check-in
///
/// Records the authenticated student as present from a scanned code. At most
/// one attendance record per (session, student) ever comes out of this, no
/// matter how many times or how concurrently the same code is submitted.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CheckInReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let db = state.db();

    if let Err(errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&errors))),
        );
    }

    match AttendanceModel::mark(db, claims.sub, &body.token, Utc::now()).await {
        Ok(CheckInOutcome::Recorded) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Attendance recorded")),
        ),
        Ok(CheckInOutcome::ExpiredOrMalformed(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(reason.to_string())),
        ),
        Ok(CheckInOutcome::UnknownSession) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Ok(CheckInOutcome::SessionClosed) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("This session is no longer active")),
        ),
        Ok(CheckInOutcome::AlreadyRecorded) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "Attendance already recorded for this session",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, student_id = claims.sub, "check-in failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Could not record attendance right now, please retry",
                )),
            )
        }
    }
}

/// POST /api/attendance/reconcile
///
/// Sweeps the student's (course, semester) enrollment for ended sessions with
/// no attendance outcome yet and back-fills them as absent. Safe to call any
/// number of times; re-runs resolve nothing and write nothing.
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<ReconcileReq>,
) -> (StatusCode, Json<ApiResponse<ReconcileResponse>>) {
    let db = state.db();

    if let Err(errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&errors))),
        );
    }

    match AttendanceModel::reconcile(db, claims.sub, body.course_id, body.semester).await {
        Ok(resolved) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ReconcileResponse { resolved },
                "Attendance history reconciled",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, student_id = claims.sub, "reconcile failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Could not reconcile attendance right now, please retry",
                )),
            )
        }
    }
}
