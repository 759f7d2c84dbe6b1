use super::ImageEditService;
use crate::models::{EditResult, GeneratedImage};
use crate::{Error, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted stand-in for a remote edit service.
///
/// Image responses cycle by call index. Queued failures and delays are
/// consumed one per call, in the order calls start.
#[derive(Clone)]
pub struct MockImageEditClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    text_responses: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<VecDeque<Option<String>>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageEditClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            text_responses: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            delays: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Adds an encoded image (any format the `image` crate decodes).
    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_text_response(self, response: String) -> Self {
        self.text_responses.lock().unwrap().push(response);
        self
    }

    /// Queues a failure (HTTP 503 carrying `message`).
    pub fn with_failure(self, message: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push_back(Some(message.to_string()));
        self
    }

    /// Lets the next call through untouched; pairs with [`Self::with_failure`]
    /// to script later calls.
    pub fn with_success(self) -> Self {
        self.failures.lock().unwrap().push_back(None);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.delays.lock().unwrap().push_back(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    async fn begin_call(&self, prompt: &str) -> Result<usize> {
        let index = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count - 1
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        // Script entries belong to the call that started, not the one that finishes.
        let delay = self.delays.lock().unwrap().pop_front();
        let failure = self.failures.lock().unwrap().pop_front().flatten();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(message) => Err(Error::http(503, Some(message))),
            None => Ok(index),
        }
    }

    fn image_for(&self, index: usize) -> Result<GeneratedImage> {
        let bytes = {
            let responses = self.image_responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses[index % responses.len()].clone())
            }
        };
        let bytes = match bytes {
            Some(bytes) => bytes,
            None => default_png()?,
        };
        GeneratedImage::decode("", bytes)
    }
}

impl Default for MockImageEditClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A 1x1 white PNG.
fn default_png() -> Result<Vec<u8>> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(1, 1, image::Rgb([255; 3])));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[async_trait]
impl ImageEditService for MockImageEditClient {
    async fn edit_image(&self, _image: &DynamicImage, prompt: &str) -> Result<GeneratedImage> {
        let index = self.begin_call(prompt).await?;
        self.image_for(index)
    }

    async fn generate_text_and_image(
        &self,
        _image: &DynamicImage,
        prompt: &str,
    ) -> Result<EditResult> {
        let index = self.begin_call(prompt).await?;
        let text = {
            let responses = self.text_responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses[index % responses.len()].clone())
            }
        };

        Ok(EditResult {
            text,
            image: Some(self.image_for(index)?),
        })
    }
}
