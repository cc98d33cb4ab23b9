//! Common types for the waste-classifier crate.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use waste_catalog::CategoryInfo;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A locally addressable image ready for submission.
///
/// Produced by an [`ImageSource`](crate::source::ImageSource). The content is
/// reference counted, so clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Where the image came from (file path, content URI)
    pub uri: String,
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Raw image bytes
    pub data: Bytes,
}

impl ImageHandle {
    /// Create a new handle.
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Create a JPEG handle.
    pub fn jpeg(uri: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(uri, "image/jpeg", data)
    }

    /// Size of the image payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Identity of a signed-in user, supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Identity {
    /// Opaque identity token
    pub user_id: String,
    /// Name shown alongside stored records
    pub display_name: String,
}

impl Identity {
    /// Create a new identity.
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A label and its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Result of one inference call.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Prediction {
    label: String,
    score: f64,
    inference_time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    alternatives: Vec<LabelScore>,
}

impl Prediction {
    /// Create a prediction.
    pub fn new(label: impl Into<String>, score: f64, inference_time_ms: u64) -> Self {
        Self {
            label: label.into(),
            score,
            inference_time_ms,
            alternatives: Vec::new(),
        }
    }

    /// Attach the ranked candidates reported by the endpoint.
    pub fn with_alternatives(mut self, alternatives: Vec<LabelScore>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Raw service label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Confidence in `[0, 1]`.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Server-side inference time.
    pub fn inference_time_ms(&self) -> u64 {
        self.inference_time_ms
    }

    /// Ranked candidates, best first. Empty when the endpoint reports none.
    pub fn alternatives(&self) -> &[LabelScore] {
        &self.alternatives
    }

    /// Confidence as a percentage with two decimals, e.g. `93.00`.
    pub fn score_percent(&self) -> f64 {
        (self.score * 10_000.0).round() / 100.0
    }
}

/// A prediction together with its resolved category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CategorizedResult {
    pub prediction: Prediction,
    pub category: CategoryInfo,
}

impl CategorizedResult {
    /// Label stored with history records.
    pub fn display_label(&self) -> &str {
        &self.category.display_name
    }
}
