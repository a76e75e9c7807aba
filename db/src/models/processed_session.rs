use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, Set};

/// Per-student set of sessions that have already been resolved, either by a
/// direct check-in or by the absentee sweep. Membership is the idempotence
/// key: it only ever grows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "processed_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    pub processed_at: DateTime<Utc>,
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

impl Model {
    /// Atomically claims the (student, session) marker via a conditional
    /// insert on the composite primary key. Returns `false` when the session
    /// was already resolved for this student, without any side effect.
    ///
    /// This single statement is the duplicate gate for both the check-in
    /// recorder and the reconciliation sweep; callers run it inside the
    /// transaction that performs the accompanying ledger write.
    pub async fn claim<C: ConnectionTrait>(
        conn: &C,
        student_id: i64,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let res = Entity::insert(ActiveModel {
            student_id: Set(student_id),
            session_id: Set(session_id),
            processed_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([Column::StudentId, Column::SessionId])
                .do_nothing()
                .to_owned(),
        )
        .exec(conn)
        .await;

        match res {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
