// lib.rs - ViraExpress generation gateway and SaaS backend
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod gemini_client;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::gateway::GenerationGateway;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::{HistoryStore, PlanStore, ProfileStore};

/// Shared by every handler through `Extension<Arc<AppState>>`.
pub struct AppState {
    pub gateway: GenerationGateway,
    pub profiles: Arc<dyn ProfileStore>,
    pub history: Arc<dyn HistoryStore>,
    pub plans: Arc<dyn PlanStore>,
    pub jwt_secret: String,
    pub generation_limiter: RateLimiter,
    /// Only used for the health probe; stores hold their own handles.
    pub db_pool: Option<sqlx::PgPool>,
    pub generation_configured: bool,
}

/// Every API route plus request logging, CORS and the shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::generation::generation_routes())
        .merge(handlers::history::history_routes())
        .merge(handlers::admin::admin_routes())
        .route("/api/status", axum::routing::get(handlers::status::api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
