//! Catalog value types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Instructions used when a label has no catalog entry.
pub const NO_GUIDANCE: &str = "no guidance available";

/// Display information for one disposal category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CategoryInfo {
    /// Name shown to the user and stored with history records
    pub display_name: String,
    /// How to dispose of items in this category
    pub disposal_instructions: String,
}

impl CategoryInfo {
    /// Create a new category entry.
    pub fn new(display_name: impl Into<String>, disposal_instructions: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            disposal_instructions: disposal_instructions.into(),
        }
    }

    /// Fallback entry for a label the catalog does not know.
    ///
    /// The raw label is kept verbatim as the display name.
    pub fn fallback(raw_label: &str) -> Self {
        Self::new(raw_label, NO_GUIDANCE)
    }

    /// Whether this entry carries real guidance.
    pub fn has_guidance(&self) -> bool {
        self.disposal_instructions != NO_GUIDANCE
    }
}
