use crate::types::EntityId;

/// Errors reported by a [`Gateway`](crate::gateway::Gateway) and other
/// domain-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend is reachable but the expected tables do not exist.
    /// Not retried; the deployment has to be fixed first.
    #[error("Backend schema missing: {0}")]
    SchemaMissing(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
