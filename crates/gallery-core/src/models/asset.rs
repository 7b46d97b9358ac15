use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::upload::UploadedFile;
use crate::constants::{DEFAULT_CONTENT_TYPE, UNTITLED_FILENAME};

/// A stored media asset: one metadata record plus the blob its `storage_key` points at.
///
/// Identity, ownership, the blob reference and the upload's name/content type are fixed at
/// creation and exposed read-only. Only `title` and `description` change afterwards, through
/// [`Asset::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Asset {
    id: Uuid,
    owner_id: Uuid,
    storage_key: String,
    name: String,
    content_type: String,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Asset {
    /// Record for a payload that has just been written under `storage_key`.
    ///
    /// Declared name and content type are recorded verbatim. A missing name falls back to
    /// `"untitled"`, a missing content type to `"application/octet-stream"`.
    pub fn from_upload(
        owner_id: Uuid,
        storage_key: impl Into<String>,
        upload: &UploadedFile,
        title: Option<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            storage_key: storage_key.into(),
            name: upload
                .declared_name()
                .unwrap_or(UNTITLED_FILENAME)
                .to_string(),
            content_type: upload
                .declared_content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            title,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, owner_id: Uuid) -> bool {
        self.owner_id == owner_id
    }

    /// Apply a title/description edit and stamp `updated_at`.
    pub fn apply(&mut self, patch: AssetPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.updated_at = Utc::now();
    }

    /// Take over the fields an upsert may change: title, description and `updated_at`.
    pub fn apply_edits_from(&mut self, source: &Asset) {
        self.title = source.title.clone();
        self.description = source.description.clone();
        self.updated_at = source.updated_at;
    }

    /// Case-insensitive substring match against title or description.
    ///
    /// An asset with neither never matches, even for an empty fragment.
    pub fn matches_fragment(&self, fragment: &str) -> bool {
        let needle = fragment.to_lowercase();
        [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(&needle))
    }
}

/// Title/description edit.
///
/// `None` leaves a field alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssetPatch {
    #[serde(default)]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<Option<String>>,
    #[serde(default)]
    #[validate(length(max = 4096, message = "Description must be at most 4096 characters"))]
    pub description: Option<Option<String>>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}
