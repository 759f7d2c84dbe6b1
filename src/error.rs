//! Error handling and custom error types
//!
//! Every failure of an edit call maps onto one of these variants. The
//! `Display` text is what a front end shows the user, so the wording of the
//! API-facing variants is kept short and human-readable.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to convert image to JPEG: {0}")]
    ImageEncoding(#[source] image::ImageError),

    #[error("Failed to serialize request: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the server's `error.message` when the
    /// body carried one, otherwise `HTTP error {status}`.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),

    #[error("No image found in response")]
    NoImageInResponse,

    #[error("Gemini API key is not configured: {0}")]
    MissingApiKey(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No previous result to edit")]
    NothingToEdit,

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Builds the error for a non-2xx response, falling back to a generic
    /// message when the server did not supply one.
    pub fn http(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error {}", status));
        Error::Http { status, message }
    }

    /// HTTP status of the failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_uses_server_message() {
        let err = Error::http(429, Some("rate limited".to_string()));
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_http_error_falls_back_to_status() {
        assert_eq!(Error::http(500, None).to_string(), "HTTP error 500");
        assert_eq!(
            Error::http(502, Some("   ".to_string())).to_string(),
            "HTTP error 502"
        );
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            Error::NoImageInResponse.to_string(),
            "No image found in response"
        );
        assert_eq!(
            Error::MalformedResponse("missing candidates".to_string()).to_string(),
            "Invalid response format: missing candidates"
        );
        assert_eq!(Error::NothingToEdit.status(), None);
    }
}
