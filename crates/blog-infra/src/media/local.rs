//! Local filesystem implementation of `MediaStore`.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use tokio::fs;
use uuid::Uuid;

use blog_core::ports::{MediaError, MediaStore};

/// Subdirectory of the media root holding post images.
const POST_IMAGES_DIR: &str = "post_images";

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g. "./media").
    root: PathBuf,
    /// Public URL prefix (e.g. "/media").
    url_prefix: String,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    /// Sniff the image format from its content, ignoring the client's file name.
    fn detect_format(data: &[u8]) -> Result<ImageFormat, MediaError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| MediaError::Io(e.to_string()))?;

        let format = reader
            .format()
            .ok_or_else(|| MediaError::UnsupportedFormat("unknown format".to_string()))?;

        // Reject files whose header does not decode.
        reader
            .into_dimensions()
            .map_err(|e| MediaError::UnsupportedFormat(e.to_string()))?;

        Ok(format)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save_image(&self, data: Vec<u8>, file_name: &str) -> Result<String, MediaError> {
        if data.len() > self.max_bytes {
            return Err(MediaError::TooLarge {
                size: data.len(),
                limit: self.max_bytes,
            });
        }

        let format = Self::detect_format(&data)?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{POST_IMAGES_DIR}/{}.{extension}", Uuid::new_v4().simple());

        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::Io(e.to_string()))?;
        }
        fs::write(&target, &data)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::info!(original = %file_name, stored = %relative, bytes = data.len(), "Image stored");
        Ok(relative)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path.trim_start_matches('/'))
    }
}
