//! Row-level change events delivered by a backend's change feed.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::note::Note;
use crate::types::{EntityId, UserId};

/// Rows that belong to exactly one user.
pub trait Owned {
    fn owner(&self) -> UserId;
    fn row_id(&self) -> EntityId;
}

impl Owned for Note {
    fn owner(&self) -> UserId {
        self.user_id
    }

    fn row_id(&self) -> EntityId {
        self.id
    }
}

impl Owned for Category {
    fn owner(&self) -> UserId {
        self.user_id
    }

    fn row_id(&self) -> EntityId {
        self.id
    }
}

/// One insert, update or delete of a row of type `T`.
///
/// Serialized as `{"op": "insert" | "update" | "delete", "row": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "row")]
pub enum RowChange<T> {
    #[serde(rename = "insert")]
    Inserted(T),
    #[serde(rename = "update")]
    Updated(T),
    /// Deletes carry only the old row's key and owner.
    #[serde(rename = "delete")]
    Deleted { id: EntityId, user_id: UserId },
}

impl<T: Owned> RowChange<T> {
    pub fn owner(&self) -> UserId {
        match self {
            RowChange::Inserted(row) | RowChange::Updated(row) => row.owner(),
            RowChange::Deleted { user_id, .. } => *user_id,
        }
    }

    pub fn row_id(&self) -> EntityId {
        match self {
            RowChange::Inserted(row) | RowChange::Updated(row) => row.row_id(),
            RowChange::Deleted { id, .. } => *id,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            RowChange::Inserted(_) => "insert",
            RowChange::Updated(_) => "update",
            RowChange::Deleted { .. } => "delete",
        }
    }
}

/// A change to one of the two user-owned tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", content = "change")]
pub enum ChangeEvent {
    #[serde(rename = "notes")]
    Note(RowChange<Note>),
    #[serde(rename = "categories")]
    Category(RowChange<Category>),
}

impl ChangeEvent {
    pub fn owner(&self) -> UserId {
        match self {
            ChangeEvent::Note(change) => change.owner(),
            ChangeEvent::Category(change) => change.owner(),
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ChangeEvent::Note(_) => "notes",
            ChangeEvent::Category(_) => "categories",
        }
    }

    pub fn row_id(&self) -> EntityId {
        match self {
            ChangeEvent::Note(change) => change.row_id(),
            ChangeEvent::Category(change) => change.row_id(),
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            ChangeEvent::Note(change) => change.op(),
            ChangeEvent::Category(change) => change.op(),
        }
    }
}
