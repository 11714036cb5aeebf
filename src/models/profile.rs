// src/models/profile.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::generation::SubscriptionPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Refunded,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "refunded" => Ok(AccountStatus::Refunded),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// The two independently metered resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditKind {
    Script,
    Image,
}

impl fmt::Display for CreditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditKind::Script => f.write_str("script"),
            CreditKind::Image => f.write_str("image"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub plan: SubscriptionPlan,
    pub status: AccountStatus,
    pub credits_total: i32,
    pub credits_used: i32,
    pub image_credits_total: i32,
    pub image_credits_used: i32,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Row as stored in the `profiles` table. Enum columns are plain TEXT.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub plan: String,
    pub status: String,
    pub credits_total: i32,
    pub credits_used: i32,
    pub image_credits_total: i32,
    pub image_credits_used: i32,
    pub last_login: Option<DateTime<Utc>>,
}

impl ProfileRow {
    pub fn into_profile(self) -> Result<(UserProfile, String), StoreError> {
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| StoreError::invalid_value("role", &self.role))?;
        let plan = self
            .plan
            .parse::<SubscriptionPlan>()
            .map_err(|_| StoreError::invalid_value("plan", &self.plan))?;
        let status = self
            .status
            .parse::<AccountStatus>()
            .map_err(|_| StoreError::invalid_value("status", &self.status))?;

        let profile = UserProfile {
            id: self.id,
            email: self.email,
            role,
            plan,
            status,
            credits_total: self.credits_total,
            credits_used: self.credits_used,
            image_credits_total: self.image_credits_total,
            image_credits_used: self.image_credits_used,
            last_login: self.last_login,
        };
        Ok((profile, self.password_hash))
    }
}

/// Partial field set for update-by-id. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<AccountStatus>,
    pub role: Option<UserRole>,
    pub credits_total: Option<i32>,
    pub credits_used: Option<i32>,
    pub image_credits_total: Option<i32>,
    pub image_credits_used: Option<i32>,
    pub last_login: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Apply the same changes to an in-memory copy of the profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(plan) = self.plan {
            profile.plan = plan;
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(v) = self.credits_total {
            profile.credits_total = v;
        }
        if let Some(v) = self.credits_used {
            profile.credits_used = v;
        }
        if let Some(v) = self.image_credits_total {
            profile.image_credits_total = v;
        }
        if let Some(v) = self.image_credits_used {
            profile.image_credits_used = v;
        }
        if let Some(ts) = self.last_login {
            profile.last_login = Some(ts);
        }
    }
}

/// Full row written by upsert-by-email.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub plan: SubscriptionPlan,
    pub status: AccountStatus,
    pub credits_total: i32,
    pub image_credits_total: i32,
}
