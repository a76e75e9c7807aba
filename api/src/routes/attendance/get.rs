use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{auth::AuthUser, response::ApiResponse};
use db::models::attendance_total::Model as TotalModel;
use util::state::AppState;

use super::common::{StatsResponse, SubjectStats, percentage};

/// GET /api/attendance/stats
///
/// The authenticated student's attendance counters, per subject plus an
/// overall rollup. Counters are maintained transactionally with the ledger,
/// so this is a cheap read with no aggregation query.
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<StatsResponse>>) {
    let db = state.db();

    match TotalModel::stats_for_student(db, claims.sub).await {
        Ok(totals) => {
            let attended: i64 = totals.iter().map(|t| t.attended_count).sum();
            let total: i64 = totals.iter().map(|t| t.total_count).sum();
            let subjects = totals.into_iter().map(SubjectStats::from_total).collect();

            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    StatsResponse {
                        subjects,
                        attended,
                        total,
                        percentage: percentage(attended, total),
                    },
                    "Attendance stats retrieved",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, student_id = claims.sub, "failed to load stats");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "Could not load attendance stats right now, please retry",
                )),
            )
        }
    }
}
