//! Note model, partial updates, and note validation.

use serde::{Deserialize, Serialize};

use crate::types::{new_id, now, EntityId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Title given to every freshly created note, and shown for empty titles.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Maximum length of a note title in characters.
pub const MAX_NOTE_TITLE_LENGTH: usize = 200;

/// Maximum length of note content in characters.
pub const MAX_NOTE_CONTENT_LENGTH: usize = 100_000;

/// Path prefix under which published notes are served read-only.
pub const SHARED_PATH_PREFIX: &str = "/shared";

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A single user-owned note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub user_id: UserId,
    pub title: String,
    /// Lightweight markup; only the display layer interprets it.
    pub content: String,
    /// `None` once the category it belonged to was deleted without a
    /// reassignment target.
    pub category_id: Option<EntityId>,
    pub is_pinned: bool,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Note {
    /// A new untitled, empty, unpinned, private note with a fresh id.
    pub fn new(user_id: UserId, category_id: Option<EntityId>) -> Self {
        let stamp = now();
        Self {
            id: new_id(),
            user_id,
            title: UNTITLED_NOTE.to_string(),
            content: String::new(),
            category_id,
            is_pinned: false,
            is_public: false,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    /// Title to render; blank titles read as [`UNTITLED_NOTE`].
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_NOTE
        } else {
            &self.title
        }
    }

    /// Path of the read-only shared page for this note.
    pub fn share_path(&self) -> String {
        format!("{SHARED_PATH_PREFIX}/{}", self.id)
    }

    /// Absolute share link under `base_url` (trailing slashes ignored).
    pub fn share_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.share_path())
    }

    /// Merge `patch` into this note and set `updated_at` to `stamp`.
    pub fn apply(&mut self, patch: &NotePatch, stamp: Timestamp) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(pinned) = patch.is_pinned {
            self.is_pinned = pinned;
        }
        if let Some(public) = patch.is_public {
            self.is_public = public;
        }
        self.updated_at = stamp;
    }

    /// Public projection, only for notes that are published.
    pub fn shared_view(&self) -> Option<SharedNote> {
        self.is_public.then(|| SharedNote {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// NotePatch
// ---------------------------------------------------------------------------

/// Partial update of a note. `None` fields are left untouched.
///
/// `category_id` is doubly optional: `Some(None)` moves the note to
/// "uncategorized".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<EntityId>>,
    pub is_pinned: Option<bool>,
    pub is_public: Option<bool>,
}

impl NotePatch {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_category(mut self, category_id: Option<EntityId>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.is_pinned = Some(pinned);
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.is_public = Some(public);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category_id.is_none()
            && self.is_pinned.is_none()
            && self.is_public.is_none()
    }

    /// Overlay `later` on top of this patch; fields set in `later` win.
    pub fn merge(&mut self, later: NotePatch) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.category_id.is_some() {
            self.category_id = later.category_id;
        }
        if later.is_pinned.is_some() {
            self.is_pinned = later.is_pinned;
        }
        if later.is_public.is_some() {
            self.is_public = later.is_public;
        }
    }
}

// ---------------------------------------------------------------------------
// SharedNote
// ---------------------------------------------------------------------------

/// The fields an anonymous viewer may read from a published note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedNote {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a patch before it is sent anywhere.
pub fn validate_patch(patch: &NotePatch) -> Result<(), String> {
    if let Some(title) = &patch.title {
        if title.chars().count() > MAX_NOTE_TITLE_LENGTH {
            return Err(format!(
                "Note title exceeds maximum length of {MAX_NOTE_TITLE_LENGTH} characters"
            ));
        }
    }
    if let Some(content) = &patch.content {
        if content.chars().count() > MAX_NOTE_CONTENT_LENGTH {
            return Err(format!(
                "Note content exceeds maximum length of {MAX_NOTE_CONTENT_LENGTH} characters"
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
