//! Schema migrations embedded from the workspace `migrations/` directory.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{debug, info};

use warden_core::error::{AppError, ErrorKind};

/// Migrations compiled into this build.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Bring the schema up to date, returning how many migrations this build
/// knows about.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, AppError> {
    for migration in MIGRATOR.iter() {
        debug!(
            version = migration.version,
            description = %migration.description,
            "Checking migration"
        );
    }

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Schema migration failed: {e}"), e)
    })?;

    let count = MIGRATOR.iter().count();
    info!(count, "Schema is up to date");
    Ok(count)
}
