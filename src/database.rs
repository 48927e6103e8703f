use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, sqlx::PgPool};
use tracing::info;

/// Connects and brings the schema up to date.
pub async fn connect(opts: impl Into<ConnectOptions>) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(opts)
        .await
        .context("Cannot connect to db")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    Ok(db)
}

/// The application connection plus a raw pool for the session store.
pub async fn setup_database(db_url: &str) -> anyhow::Result<(DatabaseConnection, PgPool)> {
    let db = connect(db_url).await?;
    info!("Database migrated");

    let pool = PgPool::connect(db_url)
        .await
        .context("Cannot open session pool")?;

    Ok((db, pool))
}
