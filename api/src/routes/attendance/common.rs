use serde::{Deserialize, Serialize};
use validator::Validate;

use db::models::attendance_total::Model as TotalModel;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInReq {
    #[validate(length(min = 1, message = "A scanned code is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReconcileReq {
    pub course_id: i64,
    #[validate(range(min = 1, message = "Semester must be at least 1"))]
    pub semester: i32,
}

#[derive(Debug, Serialize, Default)]
pub struct ReconcileResponse {
    /// Sessions this sweep resolved as absent or skipped-and-claimed. 0 means
    /// the student's history was already up to date.
    pub resolved: u64,
}

#[derive(Debug, Serialize)]
pub struct SubjectStats {
    pub subject_id: i64,
    pub attended: i64,
    pub total: i64,
    pub percentage: f64,
}

impl SubjectStats {
    pub fn from_total(t: TotalModel) -> Self {
        Self {
            subject_id: t.subject_id,
            attended: t.attended_count,
            total: t.total_count,
            percentage: percentage(t.attended_count, t.total_count),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StatsResponse {
    pub subjects: Vec<SubjectStats>,
    pub attended: i64,
    pub total: i64,
    pub percentage: f64,
}

pub fn percentage(attended: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (attended as f64 / total as f64 * 100.0).round()
    }
}
