use crate::gateway::{GeneratedImage, GenerationRequest, ObjectImage};
use crate::gemini_client::InlineData;
use crate::handlers::auth::current_profile;
use crate::handlers::error::ApiError;
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::generation_rate_limit_middleware;
use crate::models::auth::Claims;
use crate::models::generation::{
    AspectRatio, GenerationMode, Idea, Language, Persona, PromptSet, StorytellingObject, TrendVideo,
};
use crate::models::profile::CreditKind;
use crate::services::credits;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::{post, Router},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn generation_routes() -> Router {
    Router::new()
        .route("/api/generate/ideas", post(generate_ideas))
        .route("/api/generate/trends", post(discover_trends))
        .route("/api/generate/prompts", post(generate_prompts))
        .route("/api/generate/image", post(generate_image))
        .route("/api/generate/images", post(generate_object_images))
        .layer(axum::middleware::from_fn(generation_rate_limit_middleware))
        .layer(axum::middleware::from_fn(auth_middleware))
}

#[derive(Debug, Deserialize)]
pub struct NicheRequest {
    pub niche: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsRequest {
    pub idea: Idea,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default)]
    pub persona: Option<Persona>,
    /// Revision command; requires `prior_result`.
    #[serde(default)]
    pub refinement: Option<String>,
    #[serde(default)]
    pub prior_result: Option<PromptSet>,
    #[serde(default)]
    pub reference_image: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectImagesRequest {
    pub objects: Vec<StorytellingObject>,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Serialize)]
pub struct IdeasResponse {
    pub success: bool,
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub success: bool,
    pub trends: Vec<TrendVideo>,
}

#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub success: bool,
    pub prompts: PromptSet,
    pub credits_remaining: i32,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub success: bool,
    pub image: GeneratedImage,
    pub image_credits_remaining: i32,
}

#[derive(Debug, Serialize)]
pub struct ObjectImagesResponse {
    pub success: bool,
    pub images: Vec<ObjectImage>,
    pub image_credits_remaining: i32,
}

fn require_niche(niche: &str) -> Result<&str, ApiError> {
    let niche = niche.trim();
    if niche.is_empty() {
        return Err(ApiError::bad_request("Niche is required"));
    }
    Ok(niche)
}

pub async fn generate_ideas(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NicheRequest>,
) -> Result<Json<IdeasResponse>, ApiError> {
    let niche = require_niche(&payload.niche)?;
    let profile = current_profile(&state, &claims).await?;
    credits::ensure_script_credit(&profile)?;

    let ideas = state.gateway.generate_ideas(niche, payload.language).await?;
    Ok(Json(IdeasResponse { success: true, ideas }))
}

/// Trends never fail: upstream problems yield an empty list.
pub async fn discover_trends(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NicheRequest>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let niche = require_niche(&payload.niche)?;
    current_profile(&state, &claims).await?;

    let trends = state.gateway.discover_trends(niche, payload.language).await;
    Ok(Json(TrendsResponse { success: true, trends }))
}

/// First strategy for an idea costs one script credit, charged before the
/// remote call. Refinements of an existing result are free.
pub async fn generate_prompts(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PromptsRequest>,
) -> Result<Json<PromptsResponse>, ApiError> {
    let mut profile = current_profile(&state, &claims).await?;

    let mut request = GenerationRequest::strategy(payload.idea, payload.language, payload.aspect_ratio, profile.plan)
        .with_mode(payload.mode)
        .with_persona(payload.persona)
        .with_reference_image(payload.reference_image);

    match (payload.refinement, payload.prior_result) {
        (Some(command), Some(prior)) if !command.trim().is_empty() => {
            request = request.with_refinement(command, prior);
        }
        (Some(command), None) if !command.trim().is_empty() => {
            return Err(ApiError::bad_request("Refinement requires the previous result"));
        }
        _ => {
            credits::ensure_script_credit(&profile)?;
            profile = credits::consume(state.profiles.as_ref(), &profile, CreditKind::Script, 1).await?;
        }
    }

    let prompts = state.gateway.generate_prompts(&request).await?;
    Ok(Json(PromptsResponse {
        success: true,
        prompts,
        credits_remaining: credits::remaining(&profile, CreditKind::Script),
    }))
}

/// Placeholders are returned without charging an image credit.
pub async fn generate_image(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }
    let mut profile = current_profile(&state, &claims).await?;

    let image = state
        .gateway
        .generate_image(&payload.prompt, payload.aspect_ratio, &profile)
        .await?;
    if image.is_generated() {
        profile = credits::consume(state.profiles.as_ref(), &profile, CreditKind::Image, 1).await?;
    }

    Ok(Json(ImageResponse {
        success: true,
        image,
        image_credits_remaining: credits::remaining(&profile, CreditKind::Image),
    }))
}

pub async fn generate_object_images(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ObjectImagesRequest>,
) -> Result<Json<ObjectImagesResponse>, ApiError> {
    let mut profile = current_profile(&state, &claims).await?;

    let images = state
        .gateway
        .generate_object_images(&payload.objects, payload.aspect_ratio, &profile)
        .await?;
    let generated = images.iter().filter(|i| i.image.is_generated()).count() as i32;
    profile = credits::consume(state.profiles.as_ref(), &profile, CreditKind::Image, generated).await?;

    Ok(Json(ObjectImagesResponse {
        success: true,
        images,
        image_credits_remaining: credits::remaining(&profile, CreditKind::Image),
    }))
}
