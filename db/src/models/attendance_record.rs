use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder, QuerySelect, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{attendance_total, processed_session, session};
use crate::token::{self, TokenError};

/// The attendance ledger: one immutable outcome per (session, student).
///
/// Rows are created exactly once, either by the check-in recorder (present)
/// or by the reconciliation sweep (absent), and never updated afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    /// Denormalized from the session so counter updates can be scoped
    /// without a join.
    pub subject_id: i64,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_outcome")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Outcome {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Result of one check-in attempt. Everything but `Recorded` is a terminal
/// rejection with its own user-facing message; store failures surface as
/// `Err(DbErr)` instead and are the retryable class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    Recorded,
    ExpiredOrMalformed(TokenError),
    UnknownSession,
    SessionClosed,
    AlreadyRecorded,
}

impl Model {
    /// Records a student's presence from a scanned token.
    ///
    /// Verifies the token window, loads the session, then runs one
    /// transaction: re-check the session is still active (this linearizes
    /// against the presenter's end action), claim the processed-session
    /// marker, insert the present ledger row and bump both counters. The
    /// marker claim is a conditional insert, so concurrent duplicate scans
    /// resolve to exactly one `Recorded` with no partial writes.
    pub async fn mark(
        db: &DatabaseConnection,
        student_id: i64,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome, DbErr> {
        let session_id = match token::verify(raw_token, now) {
            Ok(id) => id,
            Err(reason) => return Ok(CheckInOutcome::ExpiredOrMalformed(reason)),
        };

        let Some(sess) = session::Entity::find_by_id(session_id).one(db).await? else {
            return Ok(CheckInOutcome::UnknownSession);
        };
        if !sess.is_active() {
            return Ok(CheckInOutcome::SessionClosed);
        }

        let txn = db.begin().await?;

        // The end transition may have committed since the read above.
        let Some(sess) = session::Entity::find_by_id(session_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(CheckInOutcome::UnknownSession);
        };
        if !sess.is_active() {
            txn.rollback().await?;
            return Ok(CheckInOutcome::SessionClosed);
        }

        if !processed_session::Model::claim(&txn, student_id, session_id, now).await? {
            txn.rollback().await?;
            return Ok(CheckInOutcome::AlreadyRecorded);
        }

        ActiveModel {
            session_id: Set(session_id),
            student_id: Set(student_id),
            subject_id: Set(sess.subject_id),
            outcome: Set(Outcome::Present),
            recorded_at: Set(now),
        }
        .insert(&txn)
        .await?;

        attendance_total::Model::bump(&txn, student_id, sess.subject_id, true).await?;

        txn.commit().await?;
        tracing::debug!(student_id, session_id, "attendance recorded");
        Ok(CheckInOutcome::Recorded)
    }

    /// Back-fills absent outcomes for every ended session in the student's
    /// enrollment that has not been resolved yet. Returns how many sessions
    /// this sweep resolved; an immediate re-run returns 0 with no writes.
    ///
    /// The whole sweep is one transaction. Each session is claimed through
    /// the processed-session marker first, so concurrent sweeps (two open
    /// tabs) cannot double-write absent rows or double-bump the counter.
    /// Sessions the student attended were already resolved by `mark` and are
    /// skipped by the same claim.
    pub async fn reconcile(
        db: &DatabaseConnection,
        student_id: i64,
        course_id: i64,
        semester: i32,
    ) -> Result<u64, DbErr> {
        let ended = session::Model::find_ended_for_enrollment(db, course_id, semester).await?;
        if ended.is_empty() {
            return Ok(0);
        }

        let txn = db.begin().await?;
        let now = Utc::now();
        let mut resolved = 0u64;

        for sess in ended {
            if !processed_session::Model::claim(&txn, student_id, sess.id, now).await? {
                continue;
            }

            let attended = Entity::find_by_id((sess.id, student_id))
                .one(&txn)
                .await?
                .is_some();

            if !attended {
                ActiveModel {
                    session_id: Set(sess.id),
                    student_id: Set(student_id),
                    subject_id: Set(sess.subject_id),
                    outcome: Set(Outcome::Absent),
                    // the outcome is stamped with when the session ended,
                    // not when the sweep happened to run
                    recorded_at: Set(sess.ended_at.unwrap_or(sess.created_at)),
                }
                .insert(&txn)
                .await?;

                attendance_total::Model::bump(&txn, student_id, sess.subject_id, false).await?;
            }

            resolved += 1;
        }

        if resolved == 0 {
            txn.rollback().await?;
            return Ok(0);
        }

        txn.commit().await?;
        tracing::debug!(student_id, course_id, semester, resolved, "absent sweep");
        Ok(resolved)
    }

    /// Student ids who checked in to a session, in check-in order.
    pub async fn attendees(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Outcome.eq(Outcome::Present))
            .order_by_asc(Column::RecordedAt)
            .into_tuple()
            .all(db)
            .await
    }
}
