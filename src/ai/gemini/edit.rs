use super::client::GeminiHttpClient;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, ResponseInlineData, ResponsePart,
};
use crate::ai::ImageEditService;
use crate::models::{Config, EditRequest, EditResult, GeneratedImage};
use crate::secrets::{SecretProvider, StaticSecret};
use crate::{Error, Result};
use async_trait::async_trait;
use image::DynamicImage;

/// Edits photos through Gemini's image-capable `generateContent` models.
pub struct GeminiImageEditClient {
    http: GeminiHttpClient,
}

impl GeminiImageEditClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: GeminiHttpClient::new(api_key, model),
        }
    }

    pub fn new_with_client(
        secret: Box<dyn SecretProvider>,
        model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(secret, model, client),
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                Box::new(StaticSecret::new(config.gemini_api_key.clone())),
                config.model.clone(),
                client,
            )
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    async fn send(&self, image: &DynamicImage, prompt: &str) -> Result<GenerateContentResponse> {
        let request = tokio::task::spawn_blocking({
            let image = image.clone();
            let prompt = prompt.to_string();
            move || EditRequest::from_image(&image, &prompt)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image encoding task join error: {}", e)))??;

        tracing::debug!(
            "Encoded {}x{} source as {} ({} bytes)",
            image.width(),
            image.height(),
            request.mime_type,
            request.image_bytes.len()
        );

        self.http
            .generate_content(&GenerateContentRequest::for_edit(&request))
            .await
    }
}

/// Decodes one inline payload, or `None` (with a warning) if it is unusable.
fn decode_inline(inline_data: &ResponseInlineData) -> Option<GeneratedImage> {
    let Some(data) = inline_data.data.as_deref() else {
        tracing::warn!("Skipping inline part without data");
        return None;
    };

    use base64::Engine as _;
    let bytes = match base64::engine::general_purpose::STANDARD.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Skipping inline part with invalid base64: {}", e);
            return None;
        }
    };

    match GeneratedImage::decode(&inline_data.mime_type, bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("Skipping undecodable inline image: {}", e);
            None
        }
    }
}

/// First decodable image wins.
fn first_image(parts: &[ResponsePart]) -> Option<GeneratedImage> {
    parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find_map(decode_inline)
}

/// Last text and last decodable image win, independently.
fn collect_text_and_image(parts: &[ResponsePart]) -> EditResult {
    parts.iter().fold(EditResult::default(), |mut result, part| {
        if let Some(text) = &part.text {
            result.text = Some(text.clone());
        }
        if let Some(image) = part.inline_data.as_ref().and_then(decode_inline) {
            result.image = Some(image);
        }
        result
    })
}

#[async_trait]
impl ImageEditService for GeminiImageEditClient {
    async fn edit_image(&self, image: &DynamicImage, prompt: &str) -> Result<GeneratedImage> {
        let response = self.send(image, prompt).await?;

        let generated = response
            .first_parts()
            .and_then(first_image)
            .ok_or(Error::NoImageInResponse)?;

        tracing::debug!(
            "Gemini returned {} image ({} bytes)",
            generated.mime_type,
            generated.bytes.len()
        );
        Ok(generated)
    }

    async fn generate_text_and_image(
        &self,
        image: &DynamicImage,
        prompt: &str,
    ) -> Result<EditResult> {
        let response = self.send(image, prompt).await?;

        let parts = response.first_parts().ok_or_else(|| {
            Error::MalformedResponse("expected candidates[0].content.parts".to_string())
        })?;
        let result = collect_text_and_image(parts);

        tracing::debug!(
            "Gemini returned text={} image={}",
            result.text.is_some(),
            result.image.is_some()
        );
        Ok(result)
    }
}
