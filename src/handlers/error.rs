// src/handlers/error.rs
// Mapping from domain errors to `{success: false, message, retryable}` responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::error::{AccessError, AccountError, GenerationError, StoreError};
use crate::models::auth::ErrorResponse;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
                retryable: self.retryable,
            }),
        )
            .into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let status = match &err {
            GenerationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GenerationError::Http { .. }
            | GenerationError::Transport(_)
            | GenerationError::EmptyResponse
            | GenerationError::Parse(_)
            | GenerationError::Format(_) => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Generation unavailable: {}", err);
        } else {
            tracing::warn!("Generation failed: {}", err);
        }
        let message = match &err {
            GenerationError::Transport(_) => "Could not reach the generation service".to_string(),
            other => other.to_string(),
        };
        let api = ApiError::new(status, message);
        if err.is_retryable() {
            api.retryable()
        } else {
            api
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let status = match err {
            AccessError::CreditsExhausted(_) => StatusCode::PAYMENT_REQUIRED,
            AccessError::PlanRestricted | AccessError::AccountInactive => StatusCode::FORBIDDEN,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::new(StatusCode::NOT_FOUND, format!("Not found: {}", what)),
            other => {
                tracing::error!("Store error: {}", other);
                ApiError::internal()
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AccountError::Validation(message) => ApiError::bad_request(message),
            AccountError::Access(access) => access.into(),
            AccountError::Store(store) => store.into(),
            AccountError::Hash(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal()
            }
        }
    }
}
