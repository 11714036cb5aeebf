use crate::handlers::error::ApiError;
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::models::admin::*;
use crate::models::auth::Claims;
use crate::services::accounts;
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    response::Json,
    routing::{get, put},
    Router,
};
use bcrypt::DEFAULT_COST;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/api/admin/users", get(admin_users_api).post(admin_create_user))
        .route("/api/admin/users/:id", axum::routing::delete(admin_delete_user))
        .route("/api/admin/users/:id/plan", put(admin_update_plan))
        .route("/api/admin/users/:id/status", put(admin_update_status))
        .route("/api/admin/plans", get(admin_plans_api))
        .route("/api/admin/plans/:id", put(admin_update_plan_config))
        .route("/api/admin/stats", get(admin_stats_api))
        .layer(axum::middleware::from_fn(admin_middleware))
        .layer(axum::middleware::from_fn(auth_middleware))
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
}

pub async fn admin_stats_api(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let stats = accounts::stats(state.profiles.as_ref(), state.plans.as_ref()).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// All profiles, newest first. `search` filters by email substring.
pub async fn admin_users_api(
    Query(params): Query<UsersQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let mut users = state.profiles.list().await?;
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        users.retain(|u| u.email.contains(&needle));
    }

    Ok(Json(json!({ "success": true, "total": users.len(), "users": users })))
}

pub async fn admin_create_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = accounts::create_user(state.profiles.as_ref(), state.plans.as_ref(), &payload, DEFAULT_COST).await?;
    tracing::info!("Admin {} created user {}", claims.email, user.email);

    Ok(Json(json!({
        "success": true,
        "message": "User created successfully",
        "user": user
    })))
}

pub async fn admin_update_plan(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = accounts::change_plan(state.profiles.as_ref(), state.plans.as_ref(), id, payload.plan).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn admin_update_status(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = accounts::change_status(state.profiles.as_ref(), id, payload.status).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn admin_delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if claims.sub == id.to_string() {
        return Err(ApiError::bad_request("Admins cannot delete their own account"));
    }
    accounts::delete_user(state.profiles.as_ref(), id).await?;
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}

pub async fn admin_plans_api(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let plans = state.plans.list().await?;
    Ok(Json(json!({ "success": true, "plans": plans })))
}

pub async fn admin_update_plan_config(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<PlanConfigUpdate>,
) -> Result<Json<Value>, ApiError> {
    if payload.price.is_sign_negative() || payload.image_quota < 0 {
        return Err(ApiError::bad_request("Price and image quota must not be negative"));
    }
    let plan = state.plans.update(id, &payload).await?;
    tracing::info!("💰 Plan {} updated: {} / {} images", plan.plan_name, plan.price, plan.image_quota);
    Ok(Json(json!({ "success": true, "plan": plan })))
}
