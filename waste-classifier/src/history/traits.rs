//! Record types and store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{CategorizedResult, Identity, ImageHandle};

/// Error types for persistence operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Image upload to blob storage failed
    #[error("Image upload failed: {0}")]
    Upload(String),

    /// Record append failed
    #[error("Record append failed: {0}")]
    Append(String),

    /// Listing records failed
    #[error("History query failed: {0}")]
    Query(String),
}

/// A persisted classification result.
///
/// Serialized in the record store's shape:
/// `{userId, userName, imageUrl, label, score, timestamp}`.
/// Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ClassificationRecord {
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(rename = "userName")]
    pub owner_display_name: String,
    #[serde(rename = "imageUrl")]
    pub image_ref: String,
    /// Resolved display label, frozen at creation
    pub label: String,
    pub score: f64,
    /// Assigned by the store at write time
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A record before the store stamps it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDraft {
    pub owner_id: String,
    pub owner_display_name: String,
    pub image_ref: String,
    pub label: String,
    pub score: f64,
}

impl RecordDraft {
    /// Build a draft from a categorized result and uploaded image.
    pub fn new(identity: &Identity, image_ref: impl Into<String>, result: &CategorizedResult) -> Self {
        Self {
            owner_id: identity.user_id.clone(),
            owner_display_name: identity.display_name.clone(),
            image_ref: image_ref.into(),
            label: result.display_label().to_string(),
            score: result.prediction.score(),
        }
    }

    /// Stamp the draft. Called by stores only.
    pub fn into_record(self, created_at: DateTime<Utc>) -> ClassificationRecord {
        ClassificationRecord {
            owner_id: self.owner_id,
            owner_display_name: self.owner_display_name,
            image_ref: self.image_ref,
            label: self.label,
            score: self.score,
            created_at,
        }
    }
}

/// Append-only record store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record; the store assigns `created_at`. Returns the record ID.
    async fn append(&self, draft: RecordDraft) -> Result<String, PersistenceError>;

    /// List an owner's records, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ClassificationRecord>, PersistenceError>;
}

/// Durable blob store returning retrievable references.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload an image and return its durable reference.
    async fn upload(&self, owner_id: &str, image: &ImageHandle) -> Result<String, PersistenceError>;
}
