use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;
use crate::gateway::transport::GenerationTransport;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            parts,
            role: Some("user".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Parts this client does not use (thought signatures, function calls, ...).
    Other(Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded data
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "supportedGenerationMethods", default)]
    pub supported_generation_methods: Vec<String>,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn require_key(&self) -> Result<&str, GenerationError> {
        self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("GEMINI_API_KEY is not set; generation is unavailable");
            GenerationError::Configuration(
                "Generation API key missing. Set GEMINI_API_KEY.".to_string(),
            )
        })
    }

    pub async fn generate_content(
        &self,
        model: &str,
        api_version: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let api_key = self.require_key()?;
        let url = format!("{}/{}/models/{}:generateContent", self.base_url, api_version, model);

        tracing::debug!(
            model = %model,
            contents = request.contents.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let response_text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = error_message_from_body(&response_text);
            tracing::error!("Gemini API error ({}): {}", status.as_u16(), message);
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(
            "Gemini API response (truncated): {}...",
            truncate(&response_text, 500)
        );

        serde_json::from_str::<GenerateContentResponse>(&response_text).map_err(|e| {
            tracing::error!("Failed to decode Gemini response envelope: {}", e);
            GenerationError::parse(format!("error decoding response envelope: {}", e))
        })
    }

    /// List the models visible to the configured key.
    pub async fn list_models(&self, api_version: &str) -> Result<Vec<ModelInfo>, GenerationError> {
        let api_key = self.require_key()?;
        let url = format!("{}/{}/models", self.base_url, api_version);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        let listed: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::parse(format!("error decoding model list: {}", e)))?;
        Ok(listed.models)
    }
}

#[async_trait]
impl GenerationTransport for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        api_version: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        self.generate_content(model, api_version, request).await
    }
}

/// Transport failures without the request URL attached.
fn transport_error(e: reqwest::Error) -> GenerationError {
    GenerationError::Transport(e.without_url())
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error message from server".to_string()
            } else {
                truncate(trimmed, 300).to_string()
            }
        })
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
