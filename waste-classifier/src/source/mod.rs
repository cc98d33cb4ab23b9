//! Image acquisition.
//!
//! Camera and gallery pickers belong to the presentation layer; they plug in
//! through [`ImageSource`]. A file-backed source is provided for command-line
//! use and tests.

pub mod file;

pub use file::FileImageSource;

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::types::ImageHandle;

/// Error acquiring an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The platform refused access to the camera, gallery or file
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The user backed out of the picker
    #[error("Capture cancelled")]
    Cancelled,

    /// The image could not be read or has an unsupported type
    #[error("Unreadable image: {0}")]
    Unreadable(String),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CaptureError::Cancelled | CaptureError::Unreadable(_) => ErrorKind::CaptureFailed,
        }
    }
}

/// Supplies a locally addressable image.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Acquire one image.
    async fn acquire(&self) -> Result<ImageHandle, CaptureError>;
}
