//! Repository for the `categories` table.

use jotpad_core::category::Category;
use jotpad_core::types::{EntityId, UserId};
use sqlx::{PgConnection, PgPool};

use crate::models::category::CategoryRow;

/// Column list for categories queries.
const COLUMNS: &str = "id, user_id, name, color, created_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List a user's categories, ordered by name ascending.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE user_id = $1 ORDER BY name ASC");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a category by name, case-insensitively.
    pub async fn find_by_name(
        pool: &PgPool,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<CategoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories WHERE user_id = $1 AND lower(name) = lower($2)"
        );
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(user_id)
            .bind(name.trim())
            .fetch_optional(pool)
            .await
    }

    /// Find a category by id within a user's rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        user_id: UserId,
        id: EntityId,
    ) -> Result<Option<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Lock a category row for the rest of the transaction.
    pub async fn lock(
        conn: &mut PgConnection,
        user_id: UserId,
        id: EntityId,
    ) -> Result<Option<CategoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a category with a caller-chosen id, returning the stored row.
    pub async fn create(pool: &PgPool, category: &Category) -> Result<CategoryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (id, user_id, name, color, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(&category.color)
            .bind(category.created_at)
            .fetch_one(pool)
            .await
    }

    /// Delete a category. Returns `true` if a row was deleted.
    pub async fn delete(
        conn: &mut PgConnection,
        user_id: UserId,
        id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
