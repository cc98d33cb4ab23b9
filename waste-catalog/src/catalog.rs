//! Label lookup table.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::types::CategoryInfo;

/// Built-in entries as `(label, display name, disposal instructions)`.
///
/// Covers every label produced by the supported classifier models.
pub const BUILTIN_CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "battery",
        "Battery",
        "Hazardous waste. Tape the terminals and drop off at a battery collection point.",
    ),
    (
        "biological",
        "Food Waste",
        "Drain liquids and put in the food waste bin. Bones, shells and pits go in general waste.",
    ),
    (
        "cardboard",
        "Cardboard",
        "Remove tape and labels, flatten, and bundle with paper recycling.",
    ),
    (
        "clothes",
        "Clothing",
        "Donate wearable items or use a textile collection bin. Keep dry.",
    ),
    (
        "glass",
        "Glass",
        "Rinse, remove caps, and place in glass recycling. Broken glass goes in general waste wrapped in newspaper.",
    ),
    (
        "metal",
        "Metal / Cans",
        "Empty and rinse cans. Release pressure from aerosol cans before recycling.",
    ),
    (
        "paper",
        "Paper",
        "Keep dry and free of food residue. Remove plastic covers and staples.",
    ),
    (
        "plastic",
        "Plastic",
        "Empty and rinse, remove labels where possible, and place in plastic recycling.",
    ),
    (
        "shoes",
        "Shoes",
        "Tie pairs together and use a textile or shoe collection bin.",
    ),
    (
        "trash",
        "General Waste",
        "Not recyclable. Dispose of in a general waste bag.",
    ),
];

/// Error loading a catalog definition.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The YAML document could not be parsed
    #[error("Invalid catalog definition: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Static mapping from inference labels to [`CategoryInfo`].
///
/// Lookups lowercase the raw label and match exactly; there is no partial or
/// fuzzy matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCatalog {
    entries: BTreeMap<String, CategoryInfo>,
}

// Deserialized keys go through `with_entry` so they are lowercased like any other insert.
impl<'de> Deserialize<'de> for CategoryCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, CategoryInfo>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .fold(Self::empty(), |catalog, (label, info)| catalog.with_entry(&label, info)))
    }
}

impl CategoryCatalog {
    /// Create an empty catalog. Every lookup falls back.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create the catalog with the built-in categories.
    pub fn builtin() -> Self {
        BUILTIN_CATEGORIES
            .iter()
            .fold(Self::empty(), |catalog, (label, name, instructions)| {
                catalog.with_entry(label, CategoryInfo::new(*name, *instructions))
            })
    }

    /// Load entries from YAML, a map of label to category info.
    ///
    /// ```yaml
    /// styrofoam:
    ///   display_name: Styrofoam
    ///   disposal_instructions: Clean and bag separately.
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(&self.entries)?)
    }

    /// Add or replace an entry.
    pub fn with_entry(mut self, label: &str, info: CategoryInfo) -> Self {
        self.entries.insert(label.to_lowercase(), info);
        self
    }

    /// Overlay another catalog; its entries win on conflict.
    pub fn merged(mut self, other: CategoryCatalog) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Resolve a raw label. Never fails.
    pub fn resolve(&self, raw_label: &str) -> CategoryInfo {
        match self.entries.get(&raw_label.to_lowercase()) {
            Some(info) => info.clone(),
            None => {
                debug!(label = raw_label, "No catalog entry, using fallback");
                CategoryInfo::fallback(raw_label)
            }
        }
    }

    /// Whether the label has an entry.
    pub fn contains(&self, raw_label: &str) -> bool {
        self.entries.contains_key(&raw_label.to_lowercase())
    }

    /// Known labels (lowercase), sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NO_GUIDANCE;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = CategoryCatalog::builtin();
        assert_eq!(catalog.resolve("PLASTIC"), catalog.resolve("plastic"));
        assert_eq!(catalog.resolve("Plastic").display_name, "Plastic");
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let catalog = CategoryCatalog::builtin();
        let info = catalog.resolve("unknown-material");

        assert_eq!(info.display_name, "unknown-material");
        assert_eq!(info.disposal_instructions, NO_GUIDANCE);
        assert!(!info.has_guidance());
    }

    #[test]
    fn test_fallback_keeps_raw_case() {
        let info = CategoryCatalog::empty().resolve("Styrofoam");
        assert_eq!(info.display_name, "Styrofoam");
    }

    #[test]
    fn test_no_partial_matching() {
        let catalog = CategoryCatalog::builtin();
        assert!(!catalog.contains("plastics"));
        assert_eq!(catalog.resolve("plastic bottle").display_name, "plastic bottle");
    }

    #[test]
    fn test_builtin_covers_model_labels() {
        let catalog = CategoryCatalog::builtin();
        for label in [
            "Battery", "Biological", "Cardboard", "Clothes", "Glass", "Metal", "Paper", "Plastic",
            "Shoes", "Trash",
        ] {
            assert!(catalog.contains(label), "missing {}", label);
        }
        assert_eq!(catalog.len(), BUILTIN_CATEGORIES.len());
    }

    #[test]
    fn test_yaml_overlay() {
        let yaml = r#"
Styrofoam:
  display_name: Styrofoam
  disposal_instructions: Clean and bag separately.
glass:
  display_name: Glass Bottle
  disposal_instructions: Rinse first.
"#;
        let overlay = CategoryCatalog::from_yaml(yaml).unwrap();
        assert!(overlay.contains("styrofoam"));

        let catalog = CategoryCatalog::builtin().merged(overlay);
        assert_eq!(catalog.resolve("GLASS").display_name, "Glass Bottle");
        assert_eq!(catalog.resolve("styrofoam").display_name, "Styrofoam");
        assert_eq!(catalog.resolve("paper").display_name, "Paper");
    }

    #[test]
    fn test_yaml_round_trip_preserves_lookup() {
        let catalog = CategoryCatalog::builtin();
        let yaml = catalog.to_yaml().unwrap();
        let loaded = CategoryCatalog::from_yaml(&yaml).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_deserialize_lowercases_keys() {
        let yaml = "Glass:\n  display_name: Clear Glass\n  disposal_instructions: Rinse first.\n";
        let catalog: CategoryCatalog = serde_yaml::from_str(yaml).unwrap();

        assert!(catalog.contains("glass"));
        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["glass"]);
        assert_eq!(catalog.resolve("GLASS").display_name, "Clear Glass");
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(CategoryCatalog::from_yaml("- just\n- a list").is_err());
    }
}
