// src/services/credits.rs
// Credit gates and bookkeeping. Gates are pure checks run before any remote call;
// consumption reads the current counter and writes `old + amount` back.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::error::{AccessError, StoreError};
use crate::models::generation::SubscriptionPlan;
use crate::models::profile::{CreditKind, ProfileUpdate, UserProfile};
use crate::store::ProfileStore;

pub fn remaining(profile: &UserProfile, kind: CreditKind) -> i32 {
    match kind {
        CreditKind::Script => profile.credits_total - profile.credits_used,
        CreditKind::Image => profile.image_credits_total - profile.image_credits_used,
    }
}

pub fn ensure_active(profile: &UserProfile) -> Result<(), AccessError> {
    if profile.is_active() {
        Ok(())
    } else {
        Err(AccessError::AccountInactive)
    }
}

/// Gate for idea and strategy generation.
pub fn ensure_script_credit(profile: &UserProfile) -> Result<(), AccessError> {
    ensure_active(profile)?;
    if profile.is_admin() || remaining(profile, CreditKind::Script) > 0 {
        Ok(())
    } else {
        Err(AccessError::CreditsExhausted(CreditKind::Script))
    }
}

/// Gate for image generation. Free accounts cannot generate images at all.
pub fn ensure_image_access(profile: &UserProfile) -> Result<(), AccessError> {
    ensure_active(profile)?;
    if profile.is_admin() {
        return Ok(());
    }
    if profile.plan == SubscriptionPlan::Free {
        return Err(AccessError::PlanRestricted);
    }
    if remaining(profile, CreditKind::Image) <= 0 {
        return Err(AccessError::CreditsExhausted(CreditKind::Image));
    }
    Ok(())
}

/// How many images this profile may still produce in one batch. `None` means unbounded.
pub fn image_allowance(profile: &UserProfile) -> Option<usize> {
    if profile.is_admin() {
        None
    } else {
        Some(remaining(profile, CreditKind::Image).max(0) as usize)
    }
}

/// Monthly counters reset when the previous login happened in another month or year.
pub fn monthly_reset_due(last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_login {
        Some(last) => last.month() != now.month() || last.year() != now.year(),
        None => false,
    }
}

/// Charge `amount` credits of `kind`. Admins are never charged.
pub async fn consume(
    store: &dyn ProfileStore,
    profile: &UserProfile,
    kind: CreditKind,
    amount: i32,
) -> Result<UserProfile, StoreError> {
    if profile.is_admin() || amount <= 0 {
        return Ok(profile.clone());
    }

    let update = match kind {
        CreditKind::Script => ProfileUpdate {
            credits_used: Some(profile.credits_used + amount),
            ..Default::default()
        },
        CreditKind::Image => ProfileUpdate {
            image_credits_used: Some(profile.image_credits_used + amount),
            ..Default::default()
        },
    };

    let updated = store.update(profile.id, &update).await?;
    tracing::info!(
        "Consumed {} {} credit(s) for {} ({} left)",
        amount,
        kind,
        updated.email,
        remaining(&updated, kind)
    );
    Ok(updated)
}

/// Reload the profile from the store so gates see current counters.
pub async fn refresh(store: &dyn ProfileStore, id: Uuid) -> Result<UserProfile, StoreError> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
}
