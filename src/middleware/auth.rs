use crate::handlers::auth::verify_jwt_token;
use crate::handlers::error::ApiError;
use crate::AppState;
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    // Extract token from "Bearer <token>" format
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized("Invalid Authorization header format. Expected 'Bearer <token>'")
    })?;

    let state = request
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("Application state missing from request extensions");
            ApiError::internal()
        })?;

    let claims = verify_jwt_token(token, &state.jwt_secret).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    // Handlers read the claims back through `Extension<Claims>`
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::generate_jwt_token;
    use crate::models::auth::Claims;
    use crate::models::generation::SubscriptionPlan;
    use crate::models::profile::UserRole;
    use crate::test_support::{profile, test_state};
    use axum::{body::Body, extract::Extension, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(claims): Extension<Claims>) -> String {
        claims.email
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn(auth_middleware))
            .layer(Extension(state))
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = test_state();
        let response = app(state.app.clone())
            .oneshot(axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let state = test_state();
        let user = profile(SubscriptionPlan::Basic, UserRole::User);
        let token = generate_jwt_token(&user, &state.app.jwt_secret).unwrap();

        let response = app(state.app.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, user.email.as_bytes());
    }

    #[tokio::test]
    async fn test_foreign_token_is_rejected() {
        let state = test_state();
        let user = profile(SubscriptionPlan::Basic, UserRole::User);
        let token = generate_jwt_token(&user, "someone else's secret").unwrap();

        let response = app(state.app.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
