// src/store/mod.rs
// Row stores for profiles, history and plan configuration. Postgres backs the
// server; the in-memory versions back unit tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::admin::{PlanConfig, PlanConfigUpdate};
use crate::models::history::SavedIdea;
use crate::models::profile::{NewProfile, ProfileUpdate, UserProfile};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::{PgHistoryStore, PgPlanStore, PgProfileStore};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile and its password hash. Emails are stored lowercased.
    async fn find_by_email(&self, email: &str) -> Result<Option<(UserProfile, String)>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Partial update. Fails with `NotFound` when no row has this id.
    async fn update(&self, id: Uuid, update: &ProfileUpdate) -> Result<UserProfile, StoreError>;

    /// Insert, or overwrite the row with the same email.
    async fn upsert_by_email(&self, profile: &NewProfile) -> Result<UserProfile, StoreError>;

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Most recent first, at most `HISTORY_LIMIT` entries.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SavedIdea>, StoreError>;

    async fn upsert(&self, user_id: Uuid, entry: &SavedIdea) -> Result<(), StoreError>;

    async fn delete(&self, user_id: Uuid, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn list(&self) -> Result<Vec<PlanConfig>, StoreError>;

    async fn update(&self, id: i32, update: &PlanConfigUpdate) -> Result<PlanConfig, StoreError>;
}
