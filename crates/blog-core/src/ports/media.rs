//! Storage for uploaded images.

use async_trait::async_trait;

/// Persists uploaded files below a media root.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image and return its path relative to the media root.
    async fn save_image(&self, data: Vec<u8>, file_name: &str) -> Result<String, MediaError>;

    /// Public URL of a stored file.
    fn url(&self, path: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported image: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Storage failure: {0}")]
    Io(String),
}
