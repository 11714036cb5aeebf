// src/gateway/extract.rs
// Recover structured JSON from model text that may be wrapped in prose or code fences.
// Pipeline: strip fences -> locate span -> parse -> validate shape.

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GenerationError;
use crate::gemini_client::InlineData;

/// The JSON container the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Array,
    Object,
}

impl Container {
    fn delimiters(&self) -> (char, char) {
        match self {
            Container::Array => ('[', ']'),
            Container::Object => ('{', '}'),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Container::Array => "array",
            Container::Object => "object",
        }
    }
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Slice from the first opening delimiter to the last closing one.
pub fn locate_span(text: &str, container: Container) -> Result<&str, GenerationError> {
    let (open, close) = container.delimiters();
    let start = text
        .find(open)
        .ok_or_else(|| GenerationError::parse(format!("no JSON {} found in model output", container.name())))?;
    let end = text
        .rfind(close)
        .filter(|&end| end > start)
        .ok_or_else(|| GenerationError::parse(format!("unterminated JSON {} in model output", container.name())))?;
    Ok(&text[start..=end])
}

pub fn parse_span(span: &str) -> Result<Value, GenerationError> {
    serde_json::from_str(span).map_err(|e| GenerationError::parse(format!("invalid JSON: {}", e)))
}

pub fn extract_json(text: &str, container: Container) -> Result<Value, GenerationError> {
    let cleaned = strip_code_fences(text);
    let span = locate_span(&cleaned, container)?;
    parse_span(span)
}

pub fn expect_array(value: Value) -> Result<Vec<Value>, GenerationError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(GenerationError::format(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Deserialize a recovered value into the operation's strict schema.
pub fn into_schema<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, GenerationError> {
    serde_json::from_value(value)
        .map_err(|e| GenerationError::format(format!("{} does not match the expected schema: {}", what, e)))
}

/// Turn an inline image part into a data URI. Only used by the image operation.
pub fn image_data_uri(image: &InlineData) -> Result<String, GenerationError> {
    let decoded = BASE64_STANDARD
        .decode(image.data.trim())
        .map_err(|e| GenerationError::parse(format!("image payload is not valid base64: {}", e)))?;
    if decoded.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let mime = if image.mime_type.is_empty() {
        "image/png"
    } else {
        image.mime_type.as_str()
    };
    Ok(format!("data:{};base64,{}", mime, image.data.trim()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
