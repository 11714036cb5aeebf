use crate::handlers::auth::current_profile;
use crate::handlers::error::ApiError;
use crate::models::auth::Claims;
use crate::AppState;
use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// Runs inside `auth_middleware`. The role is read from the stored profile,
/// so demoted or deactivated admins lose access before their token expires.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(claims) = request.extensions().get::<Claims>().cloned() else {
        return Err(ApiError::unauthorized("Authentication required for admin access."));
    };
    let state = request
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(ApiError::internal)?;

    let profile = current_profile(&state, &claims).await?;
    if !profile.is_admin() {
        tracing::warn!("Non-admin {} tried to reach {}", profile.email, request.uri());
        return Err(ApiError::forbidden("Admin access required."));
    }
    Ok(next.run(request).await)
}
