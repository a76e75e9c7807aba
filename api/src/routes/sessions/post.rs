use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use crate::{auth::AuthUser, response::ApiResponse};
use common::format_validation_errors;
use db::models::session::{Model as SessionModel, SessionError};
use util::state::AppState;

use super::common::{CreateSessionReq, SessionResponse};

/// POST /api/sessions
///
/// Opens a new attendance session for the authenticated presenter. The
/// session starts active; the presenter view then polls the token endpoint
/// for the rotating QR payload.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    if let Err(errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&errors))),
        );
    }

    match SessionModel::create(db, claims.sub, body.subject_id, &body.course_ids, body.semester)
        .await
    {
        Ok(session) => {
            let resp = SessionResponse::from_model(session, body.course_ids);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(resp, "Attendance session created")),
            )
        }
        Err(SessionError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
        }
        Err(SessionError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(SessionError::Db(e)) => {
            tracing::error!(error = %e, "failed to create session");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}

/// POST /api/sessions/{session_id}/end
///
/// Transitions the session active→ended. Ending an already-ended session is
/// treated as success and does not move the ended timestamp; once this call
/// returns, no further check-in for the session can succeed.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    match SessionModel::end(db, session_id, Utc::now()).await {
        Ok(session) => {
            let course_ids = SessionModel::course_ids(db, session.id)
                .await
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionResponse::from_model(session, course_ids),
                    "Session ended",
                )),
            )
        }
        Err(SessionError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(SessionError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg)))
        }
        Err(SessionError::Db(e)) => {
            tracing::error!(error = %e, session_id, "failed to end session");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}
