//! Local-only persistence: one JSON file holding two storage keys.
//!
//! The file is a flat key/value map whose values are themselves serialized
//! JSON, one key for the notes and one for the categories, so the layout
//! matches a browser-style key/value store. Each key is loaded
//! independently. An unreadable notes payload loads as no notes and an
//! unreadable categories payload as no categories, which makes the store
//! seed the default set on its next load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jotpad_core::category::Category;
use jotpad_core::error::CoreError;
use jotpad_core::gateway::{Gateway, GatewayResult};
use jotpad_core::note::{Note, NotePatch, SharedNote};
use jotpad_core::types::{EntityId, Timestamp, UserId};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::tables::Tables;

/// Storage key of the serialized note list.
pub const NOTES_STORAGE_KEY: &str = "notes-app-notes";

/// Storage key of the serialized category list.
pub const CATEGORIES_STORAGE_KEY: &str = "notes-app-categories";

pub struct LocalFileGateway {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl LocalFileGateway {
    /// Open (or start) the store at `path`. A missing file is an empty
    /// store; I/O errors other than that are returned.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_storage(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => {
                return Err(CoreError::Unavailable(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        tracing::debug!(
            path = %path.display(),
            notes = tables.notes.len(),
            categories = tables.categories.len(),
            "Opened local store"
        );
        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the tables, persist the copy, and only
    /// then make it current. A failed write leaves nothing changed.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Tables) -> Result<T, CoreError>,
    ) -> GatewayResult<T> {
        let mut tables = self.tables.lock().await;
        let mut next = tables.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *tables = next;
        Ok(out)
    }

    async fn persist(&self, tables: &Tables) -> GatewayResult<()> {
        let raw = render_storage(tables)?;
        let tmp = self.path.with_extension("tmp");
        let write_err = |e: std::io::Error| {
            CoreError::Unavailable(format!("Failed to write {}: {e}", self.path.display()))
        };
        tokio::fs::write(&tmp, raw).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Storage format
// ---------------------------------------------------------------------------

fn parse_storage(raw: &str) -> Tables {
    let entries: BTreeMap<String, String> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Local store is unreadable, starting empty");
            return Tables::default();
        }
    };
    Tables {
        notes: parse_key(&entries, NOTES_STORAGE_KEY),
        categories: parse_key(&entries, CATEGORIES_STORAGE_KEY),
    }
}

fn parse_key<T: DeserializeOwned>(entries: &BTreeMap<String, String>, key: &str) -> Vec<T> {
    let Some(value) = entries.get(key) else {
        return Vec::new();
    };
    serde_json::from_str(value).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Discarding unreadable local data");
        Vec::new()
    })
}

fn render_storage(tables: &Tables) -> Result<String, CoreError> {
    let encode = |e: serde_json::Error| CoreError::Internal(format!("Serialization failed: {e}"));
    let mut entries = BTreeMap::new();
    entries.insert(
        NOTES_STORAGE_KEY,
        serde_json::to_string(&tables.notes).map_err(encode)?,
    );
    entries.insert(
        CATEGORIES_STORAGE_KEY,
        serde_json::to_string(&tables.categories).map_err(encode)?,
    );
    serde_json::to_string_pretty(&entries).map_err(encode)
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[async_trait]
impl Gateway for LocalFileGateway {
    async fn list_categories(&self, user_id: UserId) -> GatewayResult<Vec<Category>> {
        Ok(self.tables.lock().await.list_categories(user_id))
    }

    async fn find_category_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> GatewayResult<Option<Category>> {
        Ok(self.tables.lock().await.find_category_by_name(user_id, name))
    }

    async fn insert_category(&self, category: &Category) -> GatewayResult<Category> {
        self.mutate(|t| t.insert_category(category)).await
    }

    async fn delete_category(
        &self,
        user_id: UserId,
        id: EntityId,
        reassign_to: Option<EntityId>,
        stamp: Timestamp,
    ) -> GatewayResult<u64> {
        let moved = self
            .mutate(|t| t.delete_category(user_id, id, reassign_to, stamp))
            .await?;
        Ok(moved.len() as u64)
    }

    async fn list_notes(&self, user_id: UserId) -> GatewayResult<Vec<Note>> {
        Ok(self.tables.lock().await.list_notes(user_id))
    }

    async fn insert_note(&self, note: &Note) -> GatewayResult<Note> {
        self.mutate(|t| t.insert_note(note)).await
    }

    async fn update_note(
        &self,
        user_id: UserId,
        id: EntityId,
        patch: &NotePatch,
        stamp: Timestamp,
    ) -> GatewayResult<Note> {
        self.mutate(|t| t.update_note(user_id, id, patch, stamp)).await
    }

    async fn delete_note(&self, user_id: UserId, id: EntityId) -> GatewayResult<bool> {
        self.mutate(|t| Ok(t.delete_note(user_id, id).is_some()))
            .await
    }

    async fn find_shared_note(&self, id: EntityId) -> GatewayResult<Option<SharedNote>> {
        Ok(self.tables.lock().await.find_shared_note(id))
    }
}
