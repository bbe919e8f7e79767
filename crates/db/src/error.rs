//! Mapping of sqlx errors onto [`CoreError`].

use jotpad_core::error::CoreError;

/// PostgreSQL SQLSTATE for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign key violations.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATEs meaning the schema has not been deployed: undefined table,
/// undefined column, invalid schema name.
pub const SCHEMA_MISSING_CODES: &[&str] = &["42P01", "42703", "3F000"];

/// Classify a sqlx error.
///
/// - `23505` maps to [`CoreError::Conflict`] (the constraint name is kept).
/// - `23503` maps to [`CoreError::Validation`].
/// - Missing tables/columns/schemas map to [`CoreError::SchemaMissing`].
/// - Connection-level failures map to [`CoreError::Unavailable`].
/// - Everything else maps to [`CoreError::Internal`].
pub fn classify(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            match code.as_deref() {
                Some(UNIQUE_VIOLATION) => CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {}",
                    db_err.constraint().unwrap_or("unknown")
                )),
                Some(FOREIGN_KEY_VIOLATION) => {
                    CoreError::Validation("Referenced row does not exist".to_string())
                }
                Some(code) if SCHEMA_MISSING_CODES.contains(&code) => {
                    CoreError::SchemaMissing(db_err.message().to_string())
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    CoreError::Internal(db_err.message().to_string())
                }
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => CoreError::Unavailable(err.to_string()),
        _ => {
            tracing::error!(error = %err, "Database error");
            CoreError::Internal(err.to_string())
        }
    }
}
