//! In-memory store adapters.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

use super::traits::*;
use crate::types::ImageHandle;

/// Prefix of references handed out by [`InMemoryBlobStore`].
const BLOB_SCHEME: &str = "memory://blobs/";

/// Stored record with its ID and append sequence.
#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    seq: u64,
    record: ClassificationRecord,
}

/// Append-only history kept in memory, keyed by owner.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: DashMap<String, Vec<StoredRecord>>,
    next_seq: AtomicU64,
    fail_appends: AtomicBool,
    fail_queries: AtomicBool,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append fail.
    pub fn with_failing_appends(self) -> Self {
        self.fail_appends.store(true, Ordering::SeqCst);
        self
    }

    /// Make every listing fail.
    pub fn with_failing_queries(self) -> Self {
        self.fail_queries.store(true, Ordering::SeqCst);
        self
    }

    /// Total records across all owners.
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, draft: RecordDraft) -> Result<String, PersistenceError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(PersistenceError::Append("record store unavailable".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let owner_id = draft.owner_id.clone();
        let record = draft.into_record(Utc::now());

        debug!(record_id = %id, owner_id = %owner_id, label = %record.label, "Appending record");

        self.records.entry(owner_id).or_default().push(StoredRecord {
            id: id.clone(),
            seq,
            record,
        });

        Ok(id)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ClassificationRecord>, PersistenceError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(PersistenceError::Query("record store unavailable".to_string()));
        }

        let mut stored = match self.records.get(owner_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(Vec::new()),
        };

        // Newest first; equal timestamps fall back to append order.
        stored.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        debug!(
            owner_id,
            count = stored.len(),
            ids = ?stored.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            "Listed records"
        );

        Ok(stored.into_iter().map(|s| s.record).collect())
    }
}

/// Content-addressed blob store kept in memory.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, Bytes>,
    fail_uploads: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload fail.
    pub fn with_failing_uploads(self) -> Self {
        self.fail_uploads.store(true, Ordering::SeqCst);
        self
    }

    /// Retrieve a blob by the reference returned from `upload`.
    pub fn fetch(&self, reference: &str) -> Option<Bytes> {
        let key = reference.strip_prefix(BLOB_SCHEME)?;
        self.blobs.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, owner_id: &str, image: &ImageHandle) -> Result<String, PersistenceError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PersistenceError::Upload("blob store unavailable".to_string()));
        }

        let hash = hex::encode(Sha256::digest(&image.data));
        let key = format!("{}/{}", owner_id, hash);
        self.blobs.insert(key.clone(), image.data.clone());

        Ok(format!("{}{}", BLOB_SCHEME, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(owner: &str, label: &str) -> RecordDraft {
        RecordDraft {
            owner_id: owner.to_string(),
            owner_display_name: format!("{} name", owner),
            image_ref: "memory://blobs/x".to_string(),
            label: label.to_string(),
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let store = InMemoryHistoryStore::new();

        let first = store.append(draft("alice", "Glass")).await.unwrap();
        let second = store.append(draft("alice", "Paper")).await.unwrap();
        store.append(draft("bob", "Plastic")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len(), 3);

        let records = store.list_by_owner("alice").await.unwrap();
        let labels: Vec<_> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Paper", "Glass"]);
        assert!(records[0].created_at >= records[1].created_at);
    }

    #[tokio::test]
    async fn test_list_unknown_owner_is_empty() {
        let store = InMemoryHistoryStore::new();
        assert!(store.list_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryHistoryStore::new().with_failing_appends();
        assert!(matches!(
            store.append(draft("alice", "Glass")).await,
            Err(PersistenceError::Append(_))
        ));
        assert!(store.is_empty());

        let store = InMemoryHistoryStore::new().with_failing_queries();
        assert!(matches!(
            store.list_by_owner("alice").await,
            Err(PersistenceError::Query(_))
        ));
    }

    #[tokio::test]
    async fn test_blob_upload_and_fetch() {
        let store = InMemoryBlobStore::new();
        let image = ImageHandle::jpeg("file:///tmp/can.jpg", vec![7u8; 32]);

        let reference = store.upload("alice", &image).await.unwrap();
        assert!(reference.starts_with("memory://blobs/alice/"));
        assert_eq!(store.fetch(&reference).unwrap(), image.data);

        // Same content, same reference
        let again = store.upload("alice", &image).await.unwrap();
        assert_eq!(again, reference);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_upload_failure() {
        let store = InMemoryBlobStore::new().with_failing_uploads();
        let image = ImageHandle::jpeg("file:///tmp/can.jpg", vec![7u8; 32]);

        assert!(matches!(
            store.upload("alice", &image).await,
            Err(PersistenceError::Upload(_))
        ));
        assert!(store.fetch("memory://blobs/unknown").is_none());
    }
}
