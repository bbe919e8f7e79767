use jotpad_core::error::CoreError;
use jotpad_core::types::EntityId;

/// Broad classes of store failures, each surfaced differently to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No or invalid session; blocks all data operations.
    Authentication,
    /// Rejected before any remote call.
    Validation,
    /// The backend call itself failed.
    Remote,
    /// The backend has no schema; reported once, never retried.
    SchemaMissing,
}

/// Errors returned by [`NoteStore`](crate::NoteStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("You must be signed in to do that")]
    Unauthenticated,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("A category named '{0}' already exists")]
    DuplicateCategory(String),

    #[error("You must keep at least one category")]
    LastCategory,

    #[error("No category available. Please create a category first.")]
    NoCategoryAvailable,

    #[error("Note {0} not found")]
    NoteNotFound(EntityId),

    #[error("Category {0} not found")]
    CategoryNotFound(EntityId),

    #[error("{0}")]
    Invalid(String),

    #[error("The notes database has not been set up: {0}")]
    SchemaMissing(String),

    #[error(transparent)]
    Remote(CoreError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unauthenticated | StoreError::InvalidSession(_) => {
                ErrorKind::Authentication
            }
            StoreError::DuplicateCategory(_)
            | StoreError::LastCategory
            | StoreError::NoCategoryAvailable
            | StoreError::NoteNotFound(_)
            | StoreError::CategoryNotFound(_)
            | StoreError::Invalid(_) => ErrorKind::Validation,
            StoreError::SchemaMissing(_) => ErrorKind::SchemaMissing,
            StoreError::Remote(_) => ErrorKind::Remote,
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SchemaMissing(msg) => StoreError::SchemaMissing(msg),
            CoreError::Unauthorized(msg) => StoreError::InvalidSession(msg),
            other => StoreError::Remote(other),
        }
    }
}
