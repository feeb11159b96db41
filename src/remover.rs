use async_trait::async_trait;
use thiserror::Error;

use crate::codec::ImageBlob;

/// Failure raised by the removal capability itself. The plugin adds no
/// retry, timeout, or fallback around it; the error aborts the batch and
/// propagates to the caller as-is.
#[derive(Debug, Error)]
pub enum RemovalError {
    #[error("background removal failed: {0}")]
    Failed(String),
}

/// The background-removal capability the host injects at plugin load.
///
/// The plugin never constructs an implementation of this trait; it only
/// validates that one is present (see `RemoveBgPlugin::load`) and delegates
/// one image at a time. Implementations take a binary image and return the
/// same image with the background stripped and an alpha channel added.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove(&self, image: ImageBlob) -> Result<ImageBlob, RemovalError>;
}
