use super::{ImageService, SavedImage};
use crate::ai::mime;
use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Records saves without touching the filesystem.
#[derive(Clone)]
pub struct MockImageProcessor {
    saved: Arc<Mutex<Vec<SavedImage>>>,
    base_path: PathBuf,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            base_path: PathBuf::from("/tmp"),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_path(mut self, path: PathBuf) -> Self {
        self.base_path = path;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn saved_images(&self) -> Vec<SavedImage> {
        self.saved.lock().unwrap().clone()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn save_image(&self, image: &GeneratedImage, base_name: &str) -> Result<SavedImage> {
        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Io(std::io::Error::other("Mock failure")));
        }

        // Unnameable formats are recorded as PNG, as the real processor writes them.
        let (extension, mime_type) = match mime::extension_for_mime(&image.mime_type) {
            Some(ext) => (ext, image.mime_type.clone()),
            None => ("png", "image/png".to_string()),
        };
        let saved = SavedImage {
            path: self
                .base_path
                .join(format!("{}_{}.{}", base_name, Uuid::new_v4(), extension)),
            mime_type,
        };

        self.saved.lock().unwrap().push(saved.clone());
        Ok(saved)
    }
}
