//! Row model for the `categories` table.

use jotpad_core::category::Category;
use jotpad_core::types::{EntityId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: EntityId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
    pub created_at: Timestamp,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            color: row.color,
            created_at: row.created_at,
        }
    }
}
