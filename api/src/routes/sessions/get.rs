use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{auth::AuthUser, response::ApiResponse};
use db::models::attendance_record::Model as AttendanceModel;
use db::models::session::Model as SessionModel;
use util::state::AppState;

use super::common::{
    AttendeesResponse, SessionListResponse, SessionResponse, SessionTokenResponse,
};

/// GET /api/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    match SessionModel::get(db, session_id).await {
        Ok(Some(session)) => {
            let course_ids = SessionModel::course_ids(db, session.id)
                .await
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionResponse::from_model(session, course_ids),
                    "Session retrieved",
                )),
            )
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, session_id, "failed to load session");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}

/// GET /api/sessions
///
/// Lists the authenticated presenter's currently active sessions, newest
/// first.
pub async fn list_active_sessions(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionListResponse>>) {
    let db = state.db();

    match SessionModel::find_active_by_presenter(db, claims.sub).await {
        Ok(sessions) => {
            let mut out = Vec::with_capacity(sessions.len());
            for session in sessions {
                let course_ids = SessionModel::course_ids(db, session.id)
                    .await
                    .unwrap_or_default();
                out.push(SessionResponse::from_model(session, course_ids));
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionListResponse { sessions: out },
                    "Active sessions retrieved",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list active sessions");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}

/// GET /api/sessions/{session_id}/token
///
/// Mints the QR payload the presenter view should currently display. Returns
/// 409 once the session has ended so the presenter view stops rotating.
pub async fn get_session_token(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionTokenResponse>>) {
    let db = state.db();

    match SessionModel::get(db, session_id).await {
        Ok(Some(session)) => {
            if !session.is_active() {
                return (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error("Session is no longer active")),
                );
            }
            let token = session.current_token(Utc::now());
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionTokenResponse::new(session.id, token),
                    "Session token minted",
                )),
            )
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, session_id, "failed to mint session token");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}

/// GET /api/sessions/{session_id}/attendees
///
/// Student ids recorded present for the session, in check-in order.
pub async fn list_attendees(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendeesResponse>>) {
    let db = state.db();

    match SessionModel::get(db, session_id).await {
        Ok(Some(session)) => match AttendanceModel::attendees(db, session.id).await {
            Ok(attendees) => (
                StatusCode::OK,
                Json(ApiResponse::success(
                    AttendeesResponse {
                        session_id: session.id,
                        attendees,
                    },
                    "Attendees retrieved",
                )),
            ),
            Err(e) => {
                tracing::error!(error = %e, session_id, "failed to list attendees");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::error(
                        "Session store temporarily unavailable, please retry",
                    )),
                )
            }
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(e) => {
            tracing::error!(error = %e, session_id, "failed to load session");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Session store temporarily unavailable, please retry",
                )),
            )
        }
    }
}
