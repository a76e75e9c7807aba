use serde::{Deserialize, Serialize};
use validator::Validate;

use db::models::session::Model as SessionModel;
use db::token;

#[derive(Debug, Serialize, Default)]
pub struct SessionResponse {
    pub id: i64,
    pub presenter_id: i64,
    pub subject_id: i64,
    pub course_ids: Vec<i64>,
    pub semester: i32,
    pub status: String,
    pub created_at: String,
    pub ended_at: Option<String>,
}

impl SessionResponse {
    pub fn from_model(m: SessionModel, course_ids: Vec<i64>) -> Self {
        Self {
            id: m.id,
            presenter_id: m.presenter_id,
            subject_id: m.subject_id,
            course_ids,
            semester: m.semester,
            status: m.status.to_string(),
            created_at: m.created_at.to_rfc3339(),
            ended_at: m.ended_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    pub subject_id: i64,
    #[validate(length(min = 1, message = "At least one course is required"))]
    pub course_ids: Vec<i64>,
    #[validate(range(min = 1, message = "Semester must be at least 1"))]
    pub semester: i32,
}

#[derive(Debug, Serialize, Default)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}

/// The payload the presenter view renders as a QR code. Clients re-poll
/// every `rotation_ms`; scans are accepted for `validity_ms` after minting.
#[derive(Debug, Serialize, Default)]
pub struct SessionTokenResponse {
    pub session_id: i64,
    pub token: String,
    pub rotation_ms: i64,
    pub validity_ms: i64,
}

impl SessionTokenResponse {
    pub fn new(session_id: i64, token: String) -> Self {
        Self {
            session_id,
            token,
            rotation_ms: token::ROTATION_MS,
            validity_ms: token::VALIDITY_MS,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct AttendeesResponse {
    pub session_id: i64,
    pub attendees: Vec<i64>,
}
