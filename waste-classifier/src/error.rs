//! Error taxonomy surfaced to presentation layers.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::source::CaptureError;

/// Kind of failure carried by a terminal workflow event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure or timeout reaching the endpoint
    Network,
    /// The endpoint answered with a non-success status
    Service,
    /// The endpoint answered with an unexpected body
    MalformedResponse,
    /// Blob upload or record append failed
    Persistence,
    /// A submission was already in flight
    ConcurrentSubmission,
    /// Image capture permission was refused
    PermissionDenied,
    /// Image capture was cancelled or unreadable
    CaptureFailed,
}

impl ErrorKind {
    /// Short human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network error",
            ErrorKind::Service => "service error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Persistence => "persistence error",
            ErrorKind::ConcurrentSubmission => "concurrent submission",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::CaptureFailed => "capture failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure recorded by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Synchronous rejection of a submission, before any work starts.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Another submission is still submitting or persisting
    #[error("A submission is already in flight; wait for it to finish")]
    ConcurrentSubmission,

    /// The image could not be acquired
    #[error("Image capture failed: {0}")]
    Capture(#[from] CaptureError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::ConcurrentSubmission => ErrorKind::ConcurrentSubmission,
            WorkflowError::Capture(e) => e.kind(),
        }
    }
}
