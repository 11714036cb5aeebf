// src/services/accounts.rs
// Login and admin account operations on top of the profile and plan stores.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AccessError, AccountError, StoreError};
use crate::models::admin::{default_script_credits, image_quota_for, AdminStats, CreateUserRequest};
use crate::models::generation::SubscriptionPlan;
use crate::models::profile::{AccountStatus, NewProfile, ProfileUpdate, UserProfile, UserRole};
use crate::services::credits::monthly_reset_due;
use crate::store::{PlanStore, ProfileStore};

pub const MIN_PASSWORD_LEN: usize = 4;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AccountError> {
    if !email.contains('@') {
        return Err(AccountError::Validation(format!("Invalid email: {}", email)));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Verify credentials, reject inactive accounts, apply the lazy monthly reset
/// and record the login time.
pub async fn login(
    store: &dyn ProfileStore,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<UserProfile, AccountError> {
    let email = normalize_email(email);
    let (profile, password_hash) = store
        .find_by_email(&email)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    if !bcrypt::verify(password, &password_hash)? {
        tracing::warn!("Failed login attempt for {}", email);
        return Err(AccountError::InvalidCredentials);
    }
    if !profile.is_active() {
        tracing::warn!("Login refused for {} account {}", profile.status.as_str(), email);
        return Err(AccessError::AccountInactive.into());
    }

    let mut update = ProfileUpdate {
        last_login: Some(now),
        ..Default::default()
    };
    if monthly_reset_due(profile.last_login, now) {
        tracing::info!("🔄 Monthly credit reset for {}", email);
        update.credits_used = Some(0);
        update.image_credits_used = Some(0);
    }

    let profile = store.update(profile.id, &update).await?;
    tracing::info!("✅ {} logged in ({} plan)", profile.email, profile.plan);
    Ok(profile)
}

/// Create (or overwrite) a regular user with the plan's default credits.
pub async fn create_user(
    profiles: &dyn ProfileStore,
    plans: &dyn PlanStore,
    request: &CreateUserRequest,
    bcrypt_cost: u32,
) -> Result<UserProfile, AccountError> {
    let email = normalize_email(&request.email);
    validate_credentials(&email, &request.password)?;

    let configs = plans.list().await?;
    let new = NewProfile {
        email,
        password_hash: bcrypt::hash(&request.password, bcrypt_cost)?,
        role: UserRole::User,
        plan: request.plan,
        status: AccountStatus::Active,
        credits_total: default_script_credits(request.plan),
        image_credits_total: image_quota_for(request.plan, &configs),
    };

    let profile = profiles.upsert_by_email(&new).await?;
    tracing::info!("👤 Created user {} on {} plan", profile.email, profile.plan);
    Ok(profile)
}

/// Create or promote an admin account.
pub async fn create_admin(
    profiles: &dyn ProfileStore,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<UserProfile, AccountError> {
    let email = normalize_email(email);
    validate_credentials(&email, password)?;

    let plan = SubscriptionPlan::Professional;
    let new = NewProfile {
        email,
        password_hash: bcrypt::hash(password, bcrypt_cost)?,
        role: UserRole::Admin,
        plan,
        status: AccountStatus::Active,
        credits_total: default_script_credits(plan),
        image_credits_total: 0,
    };
    Ok(profiles.upsert_by_email(&new).await?)
}

/// Switch plans. The image allowance follows the new plan's configured quota.
pub async fn change_plan(
    profiles: &dyn ProfileStore,
    plans: &dyn PlanStore,
    id: Uuid,
    plan: SubscriptionPlan,
) -> Result<UserProfile, AccountError> {
    let configs = plans.list().await?;
    let update = ProfileUpdate {
        plan: Some(plan),
        image_credits_total: Some(image_quota_for(plan, &configs)),
        ..Default::default()
    };
    let profile = profiles.update(id, &update).await?;
    tracing::info!("📋 {} moved to {} plan", profile.email, plan);
    Ok(profile)
}

pub async fn change_status(
    profiles: &dyn ProfileStore,
    id: Uuid,
    status: AccountStatus,
) -> Result<UserProfile, AccountError> {
    let update = ProfileUpdate {
        status: Some(status),
        ..Default::default()
    };
    let profile = profiles.update(id, &update).await?;
    tracing::info!("{} is now {}", profile.email, status.as_str());
    Ok(profile)
}

pub async fn delete_user(profiles: &dyn ProfileStore, id: Uuid) -> Result<(), AccountError> {
    if profiles.delete(id).await? {
        tracing::info!("🗑️ Deleted profile {}", id);
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("profile {}", id)).into())
    }
}

pub async fn stats(profiles: &dyn ProfileStore, plans: &dyn PlanStore) -> Result<AdminStats, AccountError> {
    let users = profiles.list().await?;
    let configs = plans.list().await?;
    Ok(AdminStats::compute(&users, &configs))
}
