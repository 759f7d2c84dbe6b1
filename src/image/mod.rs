//! Image encoding and persistence
//!
//! `codec` converts between in-memory images and the bytes sent over the
//! wire. The [`ImageService`] implementations store finished results.

pub mod codec;
pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::models::GeneratedImage;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SavedImage {
    pub path: PathBuf,
    pub mime_type: String,
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn save_image(&self, image: &GeneratedImage, base_name: &str) -> Result<SavedImage>;
}
