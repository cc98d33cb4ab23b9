//! Deadline wrapper for inference clients.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::traits::{ClassificationClient, ClientError};
use crate::types::{ImageHandle, Prediction};

/// Wraps a client and fails calls that exceed a deadline.
///
/// The timed-out call is dropped, not retried.
pub struct TimeoutClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C: ClassificationClient> TimeoutClient<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn elapsed_error(&self) -> ClientError {
        let after_ms = self.timeout.as_millis() as u64;
        warn!(client = self.inner.id(), after_ms, "Inference call timed out");
        ClientError::Timeout { after_ms }
    }
}

#[async_trait]
impl<C: ClassificationClient> ClassificationClient for TimeoutClient<C> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn classify(&self, image: &ImageHandle) -> Result<Prediction, ClientError> {
        tokio::time::timeout(self.timeout, self.inner.classify(image))
            .await
            .map_err(|_| self.elapsed_error())?
    }

    async fn list_labels(&self) -> Result<Vec<String>, ClientError> {
        tokio::time::timeout(self.timeout, self.inner.list_labels())
            .await
            .map_err(|_| self.elapsed_error())?
    }
}
