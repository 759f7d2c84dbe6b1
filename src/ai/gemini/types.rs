//! Gemini `generateContent` payload types.

use crate::models::EditRequest;
use serde::{Deserialize, Serialize};

/// Request-side content container.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Request-side union of text and inline media parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload sent with a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

impl GenerationConfig {
    /// Both modalities are always requested.
    pub fn text_and_image() -> Self {
        Self {
            response_modalities: vec!["Text".to_string(), "Image".to_string()],
        }
    }
}

impl GenerateContentRequest {
    /// Prompt first, then the base64 image, in a single user turn.
    pub fn for_edit(request: &EditRequest) -> Self {
        use base64::Engine as _;
        let data = base64::engine::general_purpose::STANDARD.encode(&request.image_bytes);

        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type.clone(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig::text_and_image(),
        }
    }
}

/// Top-level `generateContent` response envelope.
///
/// Everything below the root is optional so that a missing level can be told
/// apart from a body that is not shaped like a response at all.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

/// One response part. Each field is looked at independently, so a part may
/// carry text, an image, both, or neither (e.g. a bare `thoughtSignature`).
#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData")]
    pub inline_data: Option<ResponseInlineData>,
}

/// Inline payload as returned by the API; either field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate; only that candidate is ever consumed.
    pub fn first_parts(&self) -> Option<&[ResponsePart]> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_edit_request_wire_shape() {
        let request = EditRequest {
            prompt: "add a hat".to_string(),
            image_bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
        };

        let body = serde_json::to_value(GenerateContentRequest::for_edit(&request)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        { "text": "add a hat" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/" } }
                    ]
                }],
                "generationConfig": { "responseModalities": ["Text", "Image"] }
            })
        );
    }

    #[test]
    fn test_response_parts_in_order() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let parts = response.first_parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text.as_deref(), Some("here you go"));
        assert!(parts[0].inline_data.is_none());
        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_unrecognised_and_partial_parts_still_decode() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "thoughtSignature": "c2ln" },
                        { "inlineData": { "mimeType": "image/png" } },
                        { "text": "caption", "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                }
            }]
        }))
        .unwrap();

        let parts = response.first_parts().unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].text.is_none() && parts[0].inline_data.is_none());
        assert!(parts[1].inline_data.as_ref().unwrap().data.is_none());
        assert_eq!(parts[2].text.as_deref(), Some("caption"));
        assert_eq!(
            parts[2].inline_data.as_ref().unwrap().data.as_deref(),
            Some("AAAA")
        );
    }

    #[test]
    fn test_missing_levels_yield_no_parts() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({ "candidates": [] }),
            serde_json::json!({ "candidates": [{}] }),
            serde_json::json!({ "candidates": [{ "content": {} }] }),
        ] {
            let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
            assert!(response.first_parts().is_none());
        }
    }

    #[test]
    fn test_wrongly_typed_parts_fail_to_decode() {
        for body in [
            serde_json::json!({ "candidates": [{ "content": { "parts": "not a list" } }] }),
            serde_json::json!({ "candidates": [{ "content": { "parts": ["not an object"] } }] }),
            serde_json::json!({ "candidates": "nope" }),
        ] {
            let result: Result<GenerateContentResponse, _> = serde_json::from_value(body);
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_error_envelope() {
        let parsed: ApiErrorResponse = serde_json::from_str(
            r#"{"error":{"code":429,"message":"rate limited","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.error.message.as_deref(), Some("rate limited"));
    }
}
