//! File-backed image source.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{CaptureError, ImageSource};
use crate::types::ImageHandle;

/// Reads an image from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Infer an image MIME type from the file extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn acquire(&self) -> Result<ImageHandle, CaptureError> {
        let shown = self.path.display().to_string();

        let mime_type = mime_type_for(&self.path)
            .ok_or_else(|| CaptureError::Unreadable(format!("{}: unsupported image type", shown)))?;

        let data = tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied(shown.clone()),
            _ => CaptureError::Unreadable(format!("{}: {}", shown, e)),
        })?;

        if data.is_empty() {
            return Err(CaptureError::Unreadable(format!("{}: empty file", shown)));
        }

        debug!(path = %shown, bytes = data.len(), mime_type, "Acquired image");
        Ok(ImageHandle::new(shown, mime_type, data))
    }
}
