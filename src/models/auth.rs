use serde::{Deserialize, Serialize};

use crate::models::generation::SubscriptionPlan;
use crate::models::profile::{UserProfile, UserRole};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// Whether the client should offer a retry action.
    pub retryable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // profile id
    pub email: String,
    pub role: UserRole,
    pub plan: SubscriptionPlan,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&UserProfile> for Claims {
    fn from(profile: &UserProfile) -> Self {
        Claims {
            sub: profile.id.to_string(),
            email: profile.email.clone(),
            role: profile.role,
            plan: profile.plan,
            exp: 0,
            iat: 0,
        }
    }
}
