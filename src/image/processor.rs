use super::{ImageService, SavedImage};
use crate::ai::mime;
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Local;
use image::{DynamicImage, ImageFormat};
use little_exif::metadata::Metadata;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes result images into a local output directory.
pub struct ImageProcessor {
    output_dir: PathBuf,
}

impl ImageProcessor {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_sync(payload: Payload, path: PathBuf) -> Result<()> {
        match payload {
            Payload::Raw(bytes) => std::fs::write(&path, bytes)?,
            Payload::Reencode(image) => image.save_with_format(&path, ImageFormat::Png)?,
        }
        Ok(())
    }

    async fn write(&self, payload: Payload, path: &Path) -> Result<()> {
        tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || Self::write_sync(payload, path)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image save task join error: {}", e)))?
    }
}

enum Payload {
    Raw(Vec<u8>),
    Reencode(DynamicImage),
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn save_image(&self, image: &GeneratedImage, base_name: &str) -> Result<SavedImage> {
        // Payloads in a format we can name are stored untouched; anything else
        // is re-encoded so the file on disk always opens.
        let (payload, extension, mime_type) = match mime::extension_for_mime(&image.mime_type) {
            Some(ext) => (
                Payload::Raw(image.bytes.clone()),
                ext,
                image.mime_type.clone(),
            ),
            None => (
                Payload::Reencode(image.image.clone()),
                "png",
                "image/png".to_string(),
            ),
        };

        let filename = format!(
            "{}_{}_{}.{}",
            base_name,
            Local::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4(),
            extension
        );
        let path = self.output_dir.join(filename);

        self.write(payload, &path).await?;
        if let Err(e) = Metadata::file_clear_metadata(&path) {
            tracing::warn!("Failed to strip EXIF from {}: {}", path.display(), e);
        }

        tracing::debug!("Saved {} result to {}", mime_type, path.display());
        Ok(SavedImage { path, mime_type })
    }
}
