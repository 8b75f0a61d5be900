use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::state::DbPool;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder()
        .build(manager)
        .await
        .context("Failed to build the database connection pool")?;
    Ok(pool)
}

/// Migrations embedded into the binary which helps with streamlining image
/// building. Runs on a dedicated blocking connection before the pool serves
/// traffic.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_owned();
    let count = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to establish the migration connection")?;
        let versions = conn
            .run_pending_migrations(migrations)
            .map_err(|e| anyhow!("Migration error: {e}"))?;
        Ok(versions.len())
    })
    .await
    .context("Migration task panicked")??;
    Ok(count)
}

/// Startup connectivity check: a trivial round trip so an unreachable store
/// aborts the process before traffic is accepted.
pub async fn ping(pool: &DbPool) -> Result<()> {
    let mut conn = pool
        .get()
        .await
        .context("Failed to obtain a DB connection for the startup check")?;
    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .await
        .context("Database connectivity check failed")?;
    Ok(())
}
