//! Vertex AI `generateContent` client.
//!
//! The document travels inline as base64 next to the instruction text:
//!
//! ```text
//! POST {endpoint}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent
//! {
//!   "contents": [{"role": "user", "parts": [{"text": ...}, {"inlineData": {"mimeType": ..., "data": ...}}]}],
//!   "generationConfig": {"temperature": 0.0, "responseMimeType": "application/json"}
//! }
//! ```
//!
//! Only the text parts of the first candidate are returned. A reply without
//! candidates is an empty reply, which the requester retries.

use crate::config::toml_config::ModelConfig;
use crate::core::recovery::excerpt;
use crate::core::GenerativeModel;
use crate::domain::model::GenerationRequest;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_required_field;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// HTTP client for one Vertex AI model, constructed once and passed in.
#[derive(Debug, Clone)]
pub struct VertexClient {
    client: Client,
    url: String,
    access_token: Option<String>,
}

impl VertexClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let project = validate_required_field("model.project", &config.project)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            config.endpoint().trim_end_matches('/'),
            project,
            config.location(),
            config.name()
        );
        tracing::debug!("Model endpoint: {}", url);

        Ok(Self {
            client: builder.build()?,
            url,
            access_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl GenerativeModel for VertexClient {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: request.instruction,
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: request.mime_type,
                            data: base64::engine::general_purpose::STANDARD
                                .encode(request.payload),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: request.params.temperature,
                response_mime_type: request.params.json_response.then_some("application/json"),
            },
        };

        let mut http = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.access_token {
            http = http.bearer_auth(token);
        }

        let response = http.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EtlError::ModelError {
                status: status.as_u16(),
                message: excerpt(error_text.trim(), 300),
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        Ok(reply.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "extract" },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: "application/pdf",
                            data: "JVBERg==".to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: None,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "extract");
        assert_eq!(
            value["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(value["generationConfig"]["temperature"], 0.0);
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_reply_text_joins_first_candidate_parts() {
        let reply: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(reply.into_text(), "{\"a\": 1}");
    }

    #[test]
    fn test_reply_without_candidates_is_empty() {
        let reply: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "OTHER"}}))
                .unwrap();
        assert_eq!(reply.into_text(), "");
    }

    #[test]
    fn test_missing_project_is_rejected() {
        let config = ModelConfig::default();
        assert!(matches!(
            VertexClient::new(&config),
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_url_uses_location_and_model() {
        let config = ModelConfig {
            project: Some("claims-dev".to_string()),
            ..ModelConfig::default()
        };
        let client = VertexClient::new(&config).unwrap();
        assert_eq!(
            client.url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/claims-dev/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }
}
