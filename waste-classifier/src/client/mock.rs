//! Mock inference client for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::traits::{ClassificationClient, ClientError};
use crate::types::{ImageHandle, Prediction};

/// Mock client for testing.
///
/// Returns a fixed outcome and counts calls. An optional gate holds every
/// `classify` call until the test releases it, which keeps a submission
/// in flight for as long as needed.
pub struct MockClient {
    name: String,
    outcome: Result<Prediction, ClientError>,
    labels: Vec<String>,
    gate: Option<Arc<Notify>>,
    classify_calls: AtomicU32,
}

impl MockClient {
    /// Create a mock that predicts `label` with `score`.
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            name: "mock-classifier".to_string(),
            outcome: Ok(Prediction::new(label, score, 0)),
            labels: Vec::new(),
            gate: None,
            classify_calls: AtomicU32::new(0),
        }
    }

    /// Return this prediction from every call.
    pub fn with_prediction(mut self, prediction: Prediction) -> Self {
        self.outcome = Ok(prediction);
        self
    }

    /// Fail every call with this error.
    pub fn with_failure(mut self, error: ClientError) -> Self {
        self.outcome = Err(error);
        self
    }

    /// Set the labels returned by `list_labels`.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Hold `classify` until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of times `classify` was entered.
    pub fn classify_calls(&self) -> u32 {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("trash", 0.5)
    }
}

#[async_trait]
impl ClassificationClient for MockClient {
    fn id(&self) -> &str {
        &self.name
    }

    async fn classify(&self, _image: &ImageHandle) -> Result<Prediction, ClientError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcome.clone()
    }

    async fn list_labels(&self) -> Result<Vec<String>, ClientError> {
        match &self.outcome {
            Err(e) => Err(e.clone()),
            Ok(_) => Ok(self.labels.clone()),
        }
    }
}
