//! Wastewise Classifier - submission workflow and history aggregation
//!
//! Takes a locally selected image through the full classification cycle:
//! - Trait-based inference clients (HTTP endpoint, mock, timeout wrapper)
//! - Label resolution through the [`waste_catalog`] lookup table
//! - Optional persistence of results for a signed-in identity
//! - Per-user statistics over the stored history
//!
//! # Architecture
//!
//! ```text
//! ImageSource ──▶ ClassificationWorkflow ──▶ WorkflowEvents (stream)
//!                        │
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!  ClassificationClient  CategoryCatalog  BlobStore + HistoryStore
//!                                              │
//!                                              ▼
//!                                       StatsAggregator
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod source;
pub mod stats;
pub mod stream;
pub mod types;
pub mod workflow;

// Re-export main types for convenience
pub use client::{ClassificationClient, ClientError, HttpClassificationClient, TimeoutClient};
pub use config::ClientConfig;
pub use error::{ErrorKind, Failure, WorkflowError};
pub use history::{BlobStore, ClassificationRecord, HistoryStore, PersistenceError, RecordDraft};
pub use source::{CaptureError, FileImageSource, ImageSource};
pub use stats::{CategoryCount, StatsAggregator, StatsSummary};
pub use stream::{SubmissionOutcome, WorkflowEvent, WorkflowEvents};
pub use types::*;
pub use workflow::{ClassificationWorkflow, WorkflowState};

pub use waste_catalog::{CategoryCatalog, CategoryInfo};
