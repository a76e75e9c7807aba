use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::token;

/// A time-boxed attendance-taking event for one subject. Rows are append-only
/// history: a session is only ever mutated by the active→ended transition.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub presenter_id: i64,
    pub subject_id: i64,
    pub semester: i32,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    /// Set iff `status == Ended`; never moves once set.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Session lifecycle state. The only transition is active→ended.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "ended")]
    Ended,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_course::Entity")]
    Courses,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::session_course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Errors surfaced by presenter-facing session operations. Store failures
/// pass through as `Db` and are the retryable class.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("Session not found")]
    NotFound,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    /// Opens a new session: status active, no ended timestamp, course links
    /// written in the same transaction as the session row.
    pub async fn create(
        db: &DatabaseConnection,
        presenter_id: i64,
        subject_id: i64,
        course_ids: &[i64],
        semester: i32,
    ) -> Result<Model, SessionError> {
        if course_ids.is_empty() {
            return Err(SessionError::Validation(
                "At least one course is required".into(),
            ));
        }
        if semester < 1 {
            return Err(SessionError::Validation(
                "Semester must be at least 1".into(),
            ));
        }

        let txn = db.begin().await?;

        let session = ActiveModel {
            presenter_id: Set(presenter_id),
            subject_id: Set(subject_id),
            semester: Set(semester),
            status: Set(Status::Active),
            created_at: Set(Utc::now()),
            ended_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for course_id in course_ids {
            super::session_course::ActiveModel {
                session_id: Set(session.id),
                course_id: Set(*course_id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(session)
    }

    /// Transitions active→ended, stamping `ended_at` with the commit time.
    ///
    /// Ending an already-ended session is an idempotent no-op: the stored row
    /// is returned unchanged and `ended_at` does not move.
    pub async fn end(
        db: &DatabaseConnection,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Model, SessionError> {
        let Some(session) = Entity::find_by_id(session_id).one(db).await? else {
            return Err(SessionError::NotFound);
        };

        if session.status == Status::Ended {
            return Ok(session);
        }

        let mut active: ActiveModel = session.into();
        active.status = Set(Status::Ended);
        active.ended_at = Set(Some(now));
        Ok(active.update(db).await?)
    }

    pub async fn get(db: &DatabaseConnection, session_id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(session_id).one(db).await
    }

    /// Sessions this presenter currently has open, newest first.
    pub async fn find_active_by_presenter(
        db: &DatabaseConnection,
        presenter_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::PresenterId.eq(presenter_id))
            .filter(Column::Status.eq(Status::Active))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    /// Ended sessions visible to a (course, semester) enrollment. Used only
    /// by the reconciliation sweep.
    pub async fn find_ended_for_enrollment(
        db: &DatabaseConnection,
        course_id: i64,
        semester: i32,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .inner_join(super::session_course::Entity)
            .filter(super::session_course::Column::CourseId.eq(course_id))
            .filter(Column::Semester.eq(semester))
            .filter(Column::Status.eq(Status::Ended))
            .all(db)
            .await
    }

    /// Course ids this session was opened for.
    pub async fn course_ids(db: &DatabaseConnection, session_id: i64) -> Result<Vec<i64>, DbErr> {
        use sea_orm::QuerySelect;

        super::session_course::Entity::find()
            .select_only()
            .column(super::session_course::Column::CourseId)
            .filter(super::session_course::Column::SessionId.eq(session_id))
            .order_by_asc(super::session_course::Column::CourseId)
            .into_tuple()
            .all(db)
            .await
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Mints the token the presenter view should currently display.
    pub fn current_token(&self, now: DateTime<Utc>) -> String {
        token::mint(self.id, now)
    }
}
