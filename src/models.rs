//! Data models and structures
//!
//! Defines the values passed into and out of an edit call, the observable
//! client state, and the runtime configuration.

use crate::ai::mime;
use crate::image::codec;
use crate::{Error, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Payload for a single edit call. Built fresh per call and never persisted.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub image_bytes: Vec<u8>,
    pub mime_type: String,
}

impl EditRequest {
    /// JPEG-encodes `image` at [`codec::JPEG_QUALITY`].
    pub fn from_image(image: &DynamicImage, prompt: &str) -> Result<Self> {
        let image_bytes = codec::encode_jpeg(image, codec::JPEG_QUALITY)?;
        Ok(Self {
            prompt: prompt.to_string(),
            image_bytes,
            mime_type: "image/jpeg".to_string(),
        })
    }
}

/// An image returned by the API.
///
/// `bytes` is exactly the base64-decoded payload; `image` is its decoded form.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

impl GeneratedImage {
    /// Decodes `bytes`, sniffing the MIME type when the server left it blank.
    pub fn decode(declared_mime: &str, bytes: Vec<u8>) -> Result<Self> {
        let image = codec::decode_image(&bytes)?;
        let mime_type = if declared_mime.trim().is_empty() {
            mime::detect_image_mime(&bytes)
                .unwrap_or("application/octet-stream")
                .to_string()
        } else {
            declared_mime.to_string()
        };

        Ok(Self {
            mime_type,
            bytes,
            image,
        })
    }
}

/// Combined output of a text-and-image call. Either field may be absent.
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    pub text: Option<String>,
    pub image: Option<GeneratedImage>,
}

/// Observable status of an [`crate::session::EditSession`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub is_processing: bool,
    pub last_error: Option<String>,
    /// Sequence number of the call this state describes; 0 before any call.
    pub call: u64,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .ok_or_else(|| Error::MissingApiKey("GEMINI_API_KEY not set".to_string()))?;

        let timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!(
                        "GEMINI_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            gemini_api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            output_dir: lookup("GEMINATE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}
