//! Disposal category catalog for Wastewise.
//!
//! Maps the raw labels emitted by the inference endpoint onto human-readable
//! categories with disposal guidance. The catalog is read-only once built and
//! can be shared process-wide without synchronization.
//!
//! # Example
//!
//! ```
//! use waste_catalog::CategoryCatalog;
//!
//! let catalog = CategoryCatalog::builtin();
//! let info = catalog.resolve("PLASTIC");
//! assert_eq!(info.display_name, "Plastic");
//!
//! // Unknown labels never fail
//! let unknown = catalog.resolve("unknown-material");
//! assert_eq!(unknown.display_name, "unknown-material");
//! ```

pub mod catalog;
pub mod types;

pub use catalog::{CatalogError, CategoryCatalog, BUILTIN_CATEGORIES};
pub use types::{CategoryInfo, NO_GUIDANCE};
