use migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory database with all migrations applied.
///
/// The pool is pinned to a single connection: an in-memory SQLite database
/// lives and dies with its connection, and a second pooled connection would
/// see an empty schema. This also serializes concurrent writers the same way
/// a file-backed deployment does.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);

    let db = Database::connect(opt)
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}
