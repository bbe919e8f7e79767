//! PostgreSQL persistence for jotpad: pool, migrations, row models,
//! repositories, and the [`PgGateway`] implementation of
//! [`jotpad_core::gateway::Gateway`].

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod gateway;
pub mod models;
pub mod repositories;

pub use gateway::PgGateway;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the pool is usable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
