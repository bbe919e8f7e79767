//! Repository for the `notes` table.

use jotpad_core::note::{Note, NotePatch};
use jotpad_core::types::{EntityId, Timestamp, UserId};
use sqlx::{PgConnection, PgPool};

use crate::models::note::{NoteRow, SharedNoteRow};

/// Column list for notes queries.
const COLUMNS: &str = "id, user_id, title, content, category_id, is_pinned, is_public, \
    created_at, updated_at";

/// Provides CRUD operations for notes.
pub struct NoteRepo;

impl NoteRepo {
    /// List a user's notes, most recently updated first.
    pub async fn list_by_user(pool: &PgPool, user_id: UserId) -> Result<Vec<NoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes WHERE user_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a note by id within a user's rows.
    pub async fn find_by_id(
        pool: &PgPool,
        user_id: UserId,
        id: EntityId,
    ) -> Result<Option<NoteRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Public fields of a note, only if it is published. No owner filter.
    pub async fn find_public(
        pool: &PgPool,
        id: EntityId,
    ) -> Result<Option<SharedNoteRow>, sqlx::Error> {
        sqlx::query_as::<_, SharedNoteRow>(
            "SELECT id, title, content, created_at, updated_at
             FROM notes WHERE id = $1 AND is_public = TRUE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a note with a caller-chosen id, returning the stored row.
    pub async fn create(pool: &PgPool, note: &Note) -> Result<NoteRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO notes
                (id, user_id, title, content, category_id, is_pinned, is_public,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(note.id)
            .bind(note.user_id)
            .bind(&note.title)
            .bind(&note.content)
            .bind(note.category_id)
            .bind(note.is_pinned)
            .bind(note.is_public)
            .bind(note.created_at)
            .bind(note.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update and stamp `updated_at`, returning the new row.
    ///
    /// `category_id` is only touched when the patch names it, so it can be
    /// set to NULL explicitly.
    pub async fn update(
        pool: &PgPool,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> Result<Option<NoteRow>, sqlx::Error> {
        let query = format!(
            "UPDATE notes SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                category_id = CASE WHEN $5 THEN $6 ELSE category_id END,
                is_pinned = COALESCE($7, is_pinned),
                is_public = COALESCE($8, is_public),
                updated_at = $9
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&patch.title)
            .bind(&patch.content)
            .bind(patch.category_id.is_some())
            .bind(patch.category_id.flatten())
            .bind(patch.is_pinned)
            .bind(patch.is_public)
            .bind(stamp)
            .fetch_optional(pool)
            .await
    }

    /// Move every note of category `from` to `to`, stamping each.
    /// Returns the number of notes moved.
    pub async fn reassign_category(
        conn: &mut PgConnection,
        user_id: UserId,
        from: EntityId,
        to: Option<EntityId>,
        stamp: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET category_id = $3, updated_at = GREATEST($4, updated_at)
             WHERE user_id = $1 AND category_id = $2",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(stamp)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a note. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: UserId, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
