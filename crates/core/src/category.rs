//! Category model, default set, colors, and name validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{new_id, now, EntityId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

/// Maximum length of a category color value.
pub const MAX_CATEGORY_COLOR_LENGTH: usize = 32;

// `validator` length bounds must be `u64`; same values as above.
const MAX_CATEGORY_NAME_LENGTH_U64: u64 = MAX_CATEGORY_NAME_LENGTH as u64;
const MAX_CATEGORY_COLOR_LENGTH_U64: u64 = MAX_CATEGORY_COLOR_LENGTH as u64;

/// Color used when a category is created without one (slate).
pub const DEFAULT_CATEGORY_COLOR: &str = "#64748b";

/// Swatches offered by the category picker.
pub const COLOR_SWATCHES: &[&str] = &[
    "#f87171", // red
    "#fb923c", // orange
    "#facc15", // yellow
    "#4ade80", // green
    "#60a5fa", // blue
    "#a78bfa", // purple
    "#f472b6", // pink
    "#64748b", // slate
];

/// Categories created the first time a user has none: `(name, color)`.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Personal", "#f87171"),
    ("Work", "#60a5fa"),
    ("Ideas", "#4ade80"),
    ("Tasks", "#facc15"),
];

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A user-owned, color-coded note category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub user_id: UserId,
    pub name: String,
    pub color: String,
    pub created_at: Timestamp,
}

impl Category {
    pub fn new(user_id: UserId, input: &NewCategory) -> Self {
        Self {
            id: new_id(),
            user_id,
            name: normalize_category_name(&input.name),
            color: input.color.clone(),
            created_at: now(),
        }
    }

    /// Whether this category carries `name`, ignoring case and surrounding
    /// whitespace.
    pub fn has_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(
        min = 1,
        max = MAX_CATEGORY_NAME_LENGTH_U64,
        message = "Category name must be 1-50 characters"
    ))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = MAX_CATEGORY_COLOR_LENGTH_U64,
        message = "Category color must be 1-32 characters"
    ))]
    pub color: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            name: name.into(),
            color: color.unwrap_or(DEFAULT_CATEGORY_COLOR).to_string(),
        }
    }
}

/// The default category set for `user_id`, with fresh ids.
pub fn default_categories(user_id: UserId) -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color)| Category::new(user_id, &NewCategory::new(*name, Some(color))))
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Canonical stored form of a category name.
pub fn normalize_category_name(name: &str) -> String {
    name.trim().to_string()
}

/// Category names are unique per user, case-insensitively.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Validate a category creation request.
pub fn validate_new_category(input: &NewCategory) -> Result<(), String> {
    if input.name.trim().is_empty() {
        return Err("Category name is required".to_string());
    }
    let trimmed = NewCategory {
        name: normalize_category_name(&input.name),
        color: input.color.trim().to_string(),
    };
    trimmed.validate().map_err(|e| e.to_string())
}

/// Whether `color` is one of the picker swatches.
pub fn is_swatch(color: &str) -> bool {
    COLOR_SWATCHES
        .iter()
        .any(|swatch| swatch.eq_ignore_ascii_case(color))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
