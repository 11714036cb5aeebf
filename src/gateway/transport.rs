// src/gateway/transport.rs
// The seam between the gateway and the remote generation endpoint.

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::gateway::deadline::with_deadline;
use crate::gateway::prompts::BuiltRequest;
use crate::gemini_client::{GenerateContentRequest, GenerateContentResponse, InlineData, Part};

#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        api_version: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError>;
}

/// Usable content of the first candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutput {
    pub text: String,
    pub images: Vec<InlineData>,
}

impl RawOutput {
    /// Collect the text parts and inline binary parts of the first candidate.
    /// A response with neither is an `EmptyResponse`.
    pub fn from_response(response: GenerateContentResponse) -> Result<Self, GenerationError> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!("Prompt blocked by the model: {}", reason);
        }

        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut output = RawOutput::default();
        for part in parts {
            match part {
                Part::Text { text } => output.text.push_str(&text),
                Part::InlineData { inline_data } if !inline_data.data.is_empty() => {
                    output.images.push(inline_data)
                }
                _ => {}
            }
        }

        if output.text.trim().is_empty() && output.images.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(output)
    }
}

/// Send a built request and wait at most its configured timeout.
pub async fn call(
    transport: &dyn GenerationTransport,
    built: &BuiltRequest,
) -> Result<RawOutput, GenerationError> {
    let payload = built.to_payload();
    let params = &built.params;

    let response = with_deadline(
        transport.generate(&params.model, &params.api_version, &payload),
        params.timeout,
    )
    .await
    .map_err(|elapsed| {
        tracing::warn!(
            "{} request to {} abandoned after {}s",
            built.kind,
            params.model,
            elapsed.0.as_secs_f32()
        );
        GenerationError::from(elapsed)
    })??;

    if let Some(usage) = response.usage_metadata.as_ref() {
        tracing::debug!(
            model = %params.model,
            prompt_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "generation usage"
        );
    }

    RawOutput::from_response(response)
}
