use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LessonError;

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// Gemini generateContent format
#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn complete(&self, model: &str, user_message: &str) -> Result<LlmResponse, LessonError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: user_message.to_string(),
                }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(%url, prompt_chars = user_message.len(), "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LessonError::Api(format!("Không gửi được yêu cầu: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LessonError::Api(error_message(status, &body)));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LessonError::Api(format!("Không đọc được phản hồi: {}", e)))?;

        Ok(api_response.into_llm_response())
    }
}

impl GenerateContentResponse {
    fn into_llm_response(self) -> LlmResponse {
        let text = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = self.usage_metadata;
        LlmResponse {
            text,
            input_tokens: usage.as_ref().map(|u| u.prompt_token_count).unwrap_or(0),
            output_tokens: usage.as_ref().map(|u| u.candidates_token_count).unwrap_or(0),
        }
    }
}

/// Prefers the backend's own `error.message`, falls back to the raw body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{} ({})", envelope.error.message, status),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}
