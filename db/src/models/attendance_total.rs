use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryOrder, Set};

/// Denormalized attended/total counters per (student, subject).
///
/// Never mutated on its own: every bump happens inside the transaction that
/// inserts the justifying ledger row, so the counters always equal the ledger
/// aggregates after any committed write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "attendance_totals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subject_id: i64,
    pub attended_count: i64,
    pub total_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Upserts the counter row for (student, subject): +1 total, and +1
    /// attended when the co-written ledger row says present.
    ///
    /// Takes the caller's transaction; there is deliberately no variant that
    /// runs on a bare connection.
    pub async fn bump<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        subject_id: i64,
        attended: bool,
    ) -> Result<(), DbErr> {
        let row = ActiveModel {
            student_id: Set(student_id),
            subject_id: Set(subject_id),
            attended_count: Set(if attended { 1 } else { 0 }),
            total_count: Set(1),
        };

        let mut conflict = OnConflict::columns([Column::StudentId, Column::SubjectId]);
        conflict.value(Column::TotalCount, Expr::col(Column::TotalCount).add(1));
        if attended {
            conflict.value(
                Column::AttendedCount,
                Expr::col(Column::AttendedCount).add(1),
            );
        }

        Entity::insert(row)
            .on_conflict(conflict.to_owned())
            .exec(conn)
            .await?;
        Ok(())
    }

    /// All counter rows for one student, for the per-subject stats
    /// projection.
    pub async fn stats_for_student(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_asc(Column::SubjectId)
            .all(db)
            .await
    }

    pub async fn get(
        db: &DatabaseConnection,
        student_id: i64,
        subject_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((student_id, subject_id)).one(db).await
    }
}
