//! Database migration support.
//!
//! Embeds and runs SQL migrations from `motors_core/migrations/`.

use sqlx::PgPool;

/// Run all embedded database migrations against the given pool.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    tracing::debug!(migrations = migrator.iter().count(), "applying embedded migrations");
    migrator.run(pool).await
}
