// src/error.rs
use std::time::Duration;
use thiserror::Error;

use crate::models::profile::CreditKind;

/// Failures of a remote generation call, from configuration through output validation.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The API key (or another hard precondition) is missing. Not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Non-2xx answer from the generation endpoint.
    #[error("Generation API error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response decoded but carried no text and no inline data.
    #[error("Empty response from the model")]
    EmptyResponse,

    /// No JSON value could be recovered from the model output.
    #[error("Could not parse model output: {0}")]
    Parse(String),

    /// JSON was recovered but does not have the expected shape.
    #[error("Unexpected model output format: {0}")]
    Format(String),
}

impl GenerationError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Whether a manual retry can be offered to the user.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::Configuration(_))
    }
}

/// Pre-flight gate failures. These short-circuit before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("This feature is not available on the Free plan")]
    PlanRestricted,

    #[error("No {0} credits left on your plan. Upgrade to keep generating.")]
    CreditsExhausted(CreditKind),

    #[error("Account is not active")]
    AccountInactive,
}

/// Errors from the profile, history and plan stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

/// Login and account administration failures.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Local cache failures. Never surfaced past the cache itself.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is required")]
    Missing { name: &'static str },

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
