use super::types::ApiErrorResponse;
use crate::models::DEFAULT_BASE_URL;
use crate::secrets::{self, SecretProvider, StaticSecret};
use crate::{Error, Result};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Lightweight Gemini REST transport used by the edit client.
///
/// Authenticates with the `key` query parameter. No retries are attempted and
/// no timeout is applied unless one is configured.
pub struct GeminiHttpClient {
    client: Client,
    secret: Box<dyn SecretProvider>,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example
    /// `gemini-2.0-flash-exp-image-generation`), not a `models/...` path.
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(Box::new(StaticSecret::new(api_key)), model, Client::new())
    }

    pub fn new_with_client(secret: Box<dyn SecretProvider>, model: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            secret,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Overrides the API root, including the version segment
    /// (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/models/{model}:generateContent?key={api_key}`.
    pub(crate) fn generate_content_url(&self, api_key: &str) -> Result<Url> {
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let mut url = Url::parse(&raw).map_err(|e| Error::InvalidEndpoint(format!("{}: {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::InvalidEndpoint(format!(
                "{}: expected an http(s) URL with a host",
                raw
            )));
        }

        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    /// Calls Gemini's `generateContent` endpoint and decodes the body as `Resp`.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let api_key = secrets::resolve_api_key(self.secret.as_ref())?;
        let url = self.generate_content_url(&api_key)?;
        let body = serde_json::to_vec(request).map_err(Error::RequestSerialization)?;

        tracing::debug!(
            "Sending generateContent request to model {} ({} bytes)",
            self.model,
            body.len()
        );

        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            // reqwest includes the URL in its message; drop it so the key stays out of logs.
            let e = e.without_url();
            tracing::error!("Failed to send request to Gemini: {}", e);
            e
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| e.without_url())?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorResponse>(&bytes)
                .ok()
                .and_then(|parsed| parsed.error.message);
            tracing::error!(
                "Gemini API error (status {}): {}",
                status,
                String::from_utf8_lossy(&bytes)
            );
            return Err(Error::http(status.as_u16(), message));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(
                "Failed to parse Gemini response: {}\nBody: {}",
                e,
                String::from_utf8_lossy(&bytes)
            );
            Error::MalformedResponse(e.to_string())
        })
    }
}
