use crate::handlers::error::ApiError;
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::strict_rate_limit_middleware;
use crate::models::auth::*;
use crate::models::profile::UserProfile;
use crate::services::{accounts, credits};
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::{get, post, Router},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

pub const TOKEN_LIFETIME_HOURS: i64 = 24;

pub fn auth_routes() -> Router {
    let public = Router::new()
        .route("/api/auth/login", post(login))
        .layer(axum::middleware::from_fn(strict_rate_limit_middleware));

    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let profile = accounts::login(state.profiles.as_ref(), &payload.email, &payload.password, Utc::now()).await?;

    let token = generate_jwt_token(&profile, &state.jwt_secret).map_err(|e| {
        tracing::error!("Error generating JWT token: {}", e);
        ApiError::internal()
    })?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: profile,
        token,
    }))
}

/// The caller's profile with fresh credit counters.
pub async fn me(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(current_profile(&state, &claims).await?))
}

/// Load the profile behind a verified token. Inactive accounts are refused.
pub async fn current_profile(state: &AppState, claims: &Claims) -> Result<UserProfile, ApiError> {
    let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::unauthorized("Invalid token subject"))?;
    let profile = credits::refresh(state.profiles.as_ref(), id).await?;
    credits::ensure_active(&profile)?;
    Ok(profile)
}

pub fn generate_jwt_token(profile: &UserProfile, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
        ..Claims::from(profile)
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
}

pub fn verify_jwt_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
