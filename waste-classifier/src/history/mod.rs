//! Persistence seams for classification history.
//!
//! The storage backends themselves live outside this crate; only the
//! consumed capabilities are defined here, plus in-memory adapters.

pub mod memory;
pub mod traits;

pub use memory::{InMemoryBlobStore, InMemoryHistoryStore};
pub use traits::{BlobStore, ClassificationRecord, HistoryStore, PersistenceError, RecordDraft};
