//! Generative image editing
//!
//! [`ImageEditService`] is the seam between callers and the remote API.
//! [`GeminiImageEditClient`] talks to Gemini; [`MockImageEditClient`] stands
//! in for it in tests and harnesses.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiImageEditClient;
pub use mock::MockImageEditClient;

use crate::models::{EditResult, GeneratedImage};
use crate::Result;
use async_trait::async_trait;
use image::DynamicImage;

#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Returns the first image the model produces for `prompt` applied to `image`.
    async fn edit_image(&self, image: &DynamicImage, prompt: &str) -> Result<GeneratedImage>;

    /// Returns the last text and last image of the response; either may be absent.
    async fn generate_text_and_image(
        &self,
        image: &DynamicImage,
        prompt: &str,
    ) -> Result<EditResult>;
}
