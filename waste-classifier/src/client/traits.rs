//! Core trait for inference clients.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::types::{ImageHandle, Prediction};

/// Error types for inference calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// Transport failure, e.g. unreachable host
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not finish within the configured deadline
    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The endpoint rejected or failed the request
    #[error("Service error {status}: {body}")]
    Service { status: u16, body: String },

    /// The response body violates the wire contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) | ClientError::Timeout { .. } => ErrorKind::Network,
            ClientError::Service { .. } => ErrorKind::Service,
            ClientError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

/// Core trait for inference clients.
///
/// Every call is a single attempt. Retry policy belongs to the caller and no
/// results are cached.
#[async_trait]
pub trait ClassificationClient: Send + Sync {
    /// Identifier for logs (endpoint address or mock name).
    fn id(&self) -> &str;

    /// Classify an image.
    async fn classify(&self, image: &ImageHandle) -> Result<Prediction, ClientError>;

    /// List the labels the endpoint can produce. Informational only.
    async fn list_labels(&self) -> Result<Vec<String>, ClientError>;
}

#[async_trait]
impl<T: ClassificationClient + ?Sized> ClassificationClient for Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    async fn classify(&self, image: &ImageHandle) -> Result<Prediction, ClientError> {
        (**self).classify(image).await
    }

    async fn list_labels(&self) -> Result<Vec<String>, ClientError> {
        (**self).list_labels().await
    }
}
