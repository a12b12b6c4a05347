//! Database module for PostgreSQL connection management.

use crate::config::DatabaseConfig;
use crate::models::RoleName;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(config.url.expose_secret())
        .await?;

    tracing::info!("Successfully connected to PostgreSQL");

    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Insert the five built-in roles. Existing rows are left untouched.
pub async fn seed_roles(pool: &PgPool) -> Result<(), sqlx::Error> {
    for role in RoleName::ALL {
        sqlx::query(
            "INSERT INTO usr_role (role_name, role_description) VALUES ($1, $2) \
             ON CONFLICT (role_name) DO NOTHING",
        )
        .bind(role.as_str())
        .bind(role.default_description())
        .execute(pool)
        .await?;
    }

    tracing::info!(count = RoleName::ALL.len(), "Roles seeded");
    Ok(())
}

/// Check database health.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
