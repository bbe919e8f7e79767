//! In-process row tables with the same semantics the PostgreSQL schema
//! enforces: per-user scoping, case-insensitive unique category names,
//! and restrict-on-delete for referenced categories.
//!
//! Shared by [`MemoryGateway`](crate::MemoryGateway) and
//! [`LocalFileGateway`](crate::LocalFileGateway).

use jotpad_core::category::{names_match, Category};
use jotpad_core::error::CoreError;
use jotpad_core::note::{Note, NotePatch, SharedNote};
use jotpad_core::types::{EntityId, Timestamp, UserId};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
}

impl Tables {
    pub fn list_categories(&self, user_id: UserId) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    pub fn find_category_by_name(&self, user_id: UserId, name: &str) -> Option<Category> {
        self.categories
            .iter()
            .find(|c| c.user_id == user_id && c.has_name(name))
            .cloned()
    }

    fn has_category(&self, user_id: UserId, id: EntityId) -> bool {
        self.categories
            .iter()
            .any(|c| c.user_id == user_id && c.id == id)
    }

    pub fn insert_category(&mut self, category: &Category) -> Result<Category, CoreError> {
        let duplicate = self.categories.iter().any(|c| {
            c.id == category.id
                || (c.user_id == category.user_id && names_match(&c.name, &category.name))
        });
        if duplicate {
            return Err(CoreError::Conflict(format!(
                "Category '{}' already exists",
                category.name
            )));
        }
        self.categories.push(category.clone());
        Ok(category.clone())
    }

    /// Reassign (or orphan) the category's notes and remove it. Returns the
    /// notes that moved. Nothing changes when an error is returned.
    pub fn delete_category(
        &mut self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> Result<Vec<Note>, CoreError> {
        if !self.has_category(user_id, id) {
            return Err(CoreError::NotFound {
                entity: "Category",
                id,
            });
        }
        if let Some(target) = reassign_to {
            if target == id || !self.has_category(user_id, target) {
                return Err(CoreError::NotFound {
                    entity: "Category",
                    id: target,
                });
            }
        }

        let mut moved = Vec::new();
        for note in self
            .notes
            .iter_mut()
            .filter(|n| n.user_id == user_id && n.category_id == Some(id))
        {
            note.category_id = reassign_to;
            note.updated_at = note.updated_at.max(stamp);
            moved.push(note.clone());
        }
        self.categories.retain(|c| c.id != id);
        Ok(moved)
    }

    pub fn list_notes(&self, user_id: UserId) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }

    pub fn insert_note(&mut self, note: &Note) -> Result<Note, CoreError> {
        if self.notes.iter().any(|n| n.id == note.id) {
            return Err(CoreError::Conflict(format!("Note {} already exists", note.id)));
        }
        if let Some(category_id) = note.category_id {
            if !self.has_category(note.user_id, category_id) {
                return Err(CoreError::Validation(format!(
                    "Category {category_id} does not exist"
                )));
            }
        }
        self.notes.push(note.clone());
        Ok(note.clone())
    }

    pub fn update_note(
        &mut self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> Result<Note, CoreError> {
        if let Some(Some(category_id)) = patch.category_id {
            if !self.has_category(user_id, category_id) {
                return Err(CoreError::Validation(format!(
                    "Category {category_id} does not exist"
                )));
            }
        }
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.user_id == user_id && n.id == id)
            .ok_or(CoreError::NotFound { entity: "Note", id })?;
        note.apply(patch, stamp);
        Ok(note.clone())
    }

    /// The removed note, or `None` if it was already gone.
    pub fn delete_note(&mut self, user_id: UserId, id: EntityId) -> Option<Note> {
        let index = self
            .notes
            .iter()
            .position(|n| n.user_id == user_id && n.id == id)?;
        Some(self.notes.remove(index))
    }

    pub fn find_shared_note(&self, id: EntityId) -> Option<SharedNote> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .and_then(Note::shared_view)
    }
}
