//! Row model for the `notes` table.

use jotpad_core::note::{Note, SharedNote};
use jotpad_core::types::{EntityId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `notes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: EntityId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub category_id: Option<EntityId>,
    pub is_pinned: bool,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            category_id: row.category_id,
            is_pinned: row.is_pinned,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// The public projection returned by the shared-note query.
#[derive(Debug, Clone, FromRow)]
pub struct SharedNoteRow {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SharedNoteRow> for SharedNote {
    fn from(row: SharedNoteRow) -> Self {
        SharedNote {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
