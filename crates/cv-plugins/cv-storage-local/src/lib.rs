//! # cv-storage-local
//! Local filesystem implementation of `MediaStore` for candidate photos.
//! Files are content-addressed: the name is the SHA-256 of the bytes.

use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;

use async_trait::async_trait;
use cv_core::error::{AppError, Result};
use cv_core::traits::MediaStore;
use image::{ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use tokio::fs;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub struct LocalMediaStore {
    /// Directory holding the photos (e.g., "./public/uploads/candidates")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/uploads/candidates")
    url_prefix: String,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    /// Maps a public URL back to a file under the root. Anything outside the
    /// prefix, or trying to climb out of it, yields `None`.
    fn local_path(&self, photo_url: &str) -> Option<PathBuf> {
        let file = photo_url
            .strip_prefix(&self.url_prefix)?
            .strip_prefix('/')?;
        if file.is_empty() || file.contains('/') || file.contains('\\') || file.contains("..") {
            return None;
        }
        Some(self.root_path.join(file))
    }
}

fn extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

fn io_err(e: std::io::Error) -> AppError {
    tracing::error!(error = %e, "media store I/O failed");
    AppError::Internal(format!("media store: {e}"))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let content_type = content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::ValidationError(
                "Only JPEG, PNG, and WEBP images are allowed".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(AppError::ValidationError("No file uploaded".to_string()));
        }
        if data.len() > self.max_bytes {
            return Err(AppError::ValidationError(format!(
                "File too large, limit is {} bytes",
                self.max_bytes
            )));
        }

        // The declared type is only a hint; the bytes decide the extension.
        let format = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .ok()
            .and_then(|r| r.format());
        let ext = format.and_then(extension).ok_or_else(|| {
            AppError::ValidationError("Only JPEG, PNG, and WEBP images are allowed".to_string())
        })?;

        let file_name = format!("{}.{ext}", hex::encode(Sha256::digest(&data)));
        let target_path = self.root_path.join(&file_name);

        fs::create_dir_all(&self.root_path).await.map_err(io_err)?;
        if fs::try_exists(&target_path).await.map_err(io_err)? {
            tracing::debug!(file = %file_name, "photo already stored");
        } else {
            fs::write(&target_path, &data).await.map_err(io_err)?;
            tracing::info!(file = %file_name, bytes = data.len(), "photo stored");
        }

        Ok(format!("{}/{file_name}", self.url_prefix))
    }

    async fn remove(&self, photo_url: &str) -> Result<()> {
        let Some(path) = self.local_path(photo_url) else {
            tracing::debug!(photo_url, "not a managed photo, leaving it alone");
            return Ok(());
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn store(max_bytes: usize) -> LocalMediaStore {
        let dir = std::env::temp_dir().join(format!("cv-storage-{}", uuid::Uuid::new_v4()));
        LocalMediaStore::new(dir, "/uploads/candidates/", max_bytes)
    }

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn png_is_stored_under_its_hash() {
        let store = store(1 << 20);
        let data = encoded(ImageFormat::Png);
        let expected = format!("/uploads/candidates/{}.png", hex::encode(Sha256::digest(&data)));

        let url = store.save_upload(data.clone(), "image/png").await.unwrap();
        assert_eq!(url, expected);
        assert!(store.local_path(&url).unwrap().exists());

        // Same bytes, same path.
        assert_eq!(store.save_upload(data, "image/png").await.unwrap(), url);
    }

    #[tokio::test]
    async fn extension_follows_the_bytes() {
        let store = store(1 << 20);
        let url = store
            .save_upload(encoded(ImageFormat::Jpeg), "image/png")
            .await
            .unwrap();
        assert!(url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn rejects_disallowed_type_and_oversize() {
        let store = store(16);
        assert!(matches!(
            store.save_upload(vec![0; 8], "application/pdf").await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            store.save_upload(encoded(ImageFormat::Png), "image/png").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn rejects_bytes_that_are_not_an_image() {
        let store = store(1 << 20);
        assert!(matches!(
            store.save_upload(b"hello, world".to_vec(), "image/jpeg").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn remove_deletes_managed_files_only() {
        let store = store(1 << 20);
        let url = store
            .save_upload(encoded(ImageFormat::Png), "image/png")
            .await
            .unwrap();
        let path = store.local_path(&url).unwrap();

        store.remove("/somewhere/else.png").await.unwrap();
        store.remove("/uploads/candidates/../secret").await.unwrap();
        assert!(path.exists());

        store.remove(&url).await.unwrap();
        assert!(!path.exists());
        // Removing twice is fine.
        store.remove(&url).await.unwrap();
    }
}
