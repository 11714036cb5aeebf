// src/store/postgres.rs
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::admin::{PlanConfig, PlanConfigRow, PlanConfigUpdate};
use crate::models::history::{SavedIdea, HISTORY_LIMIT};
use crate::models::profile::{NewProfile, ProfileRow, ProfileUpdate, UserProfile};
use crate::store::{HistoryStore, PlanStore, ProfileStore};

const PROFILE_COLUMNS: &str = "id, email, password_hash, role, plan, status, credits_total, credits_used, \
     image_credits_total, image_credits_used, last_login";

const PLAN_COLUMNS: &str = "id, plan_name, price, image_quota, checkout_url, active";

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<(UserProfile, String)>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE email = $1",
            PROFILE_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProfileRow::into_profile).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile).transpose()?.map(|(profile, _)| profile))
    }

    async fn update(&self, id: Uuid, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        if update.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE profiles SET ");
        let mut fields = builder.separated(", ");
        if let Some(plan) = update.plan {
            fields.push("plan = ").push_bind_unseparated(plan.as_str());
        }
        if let Some(status) = update.status {
            fields.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(role) = update.role {
            fields.push("role = ").push_bind_unseparated(role.as_str());
        }
        if let Some(v) = update.credits_total {
            fields.push("credits_total = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.credits_used {
            fields.push("credits_used = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.image_credits_total {
            fields.push("image_credits_total = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.image_credits_used {
            fields.push("image_credits_used = ").push_bind_unseparated(v);
        }
        if let Some(ts) = update.last_login {
            fields.push("last_login = ").push_bind_unseparated(ts);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PROFILE_COLUMNS);

        let row = builder
            .build_query_as::<ProfileRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        Ok(row.into_profile()?.0)
    }

    async fn upsert_by_email(&self, profile: &NewProfile) -> Result<UserProfile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (email, password_hash, role, plan, status, credits_total, image_credits_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                plan = EXCLUDED.plan,
                status = EXCLUDED.status,
                credits_total = EXCLUDED.credits_total,
                credits_used = 0,
                image_credits_total = EXCLUDED.image_credits_total,
                image_credits_used = 0
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(profile.email.trim().to_lowercase())
        .bind(&profile.password_hash)
        .bind(profile.role.as_str())
        .bind(profile.plan.as_str())
        .bind(profile.status.as_str())
        .bind(profile.credits_total)
        .bind(profile.image_credits_total)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_profile()?.0)
    }

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_profile().map(|(profile, _)| profile))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SavedIdea>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<SavedIdea>>(
            "SELECT idea_data FROM history WHERE user_id = $1 ORDER BY updated_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(entry)| entry).collect())
    }

    async fn upsert(&self, user_id: Uuid, entry: &SavedIdea) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO history (user_id, id, idea_data)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, id) DO UPDATE SET
                idea_data = EXCLUDED.idea_data,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(entry.id())
        .bind(Json(entry))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM history WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn list(&self) -> Result<Vec<PlanConfig>, StoreError> {
        let rows = sqlx::query_as::<_, PlanConfigRow>(&format!(
            "SELECT {} FROM plan_config ORDER BY price ASC",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlanConfigRow::into_config).collect()
    }

    async fn update(&self, id: i32, update: &PlanConfigUpdate) -> Result<PlanConfig, StoreError> {
        let row = sqlx::query_as::<_, PlanConfigRow>(&format!(
            r#"
            UPDATE plan_config
            SET price = $1, image_quota = $2, checkout_url = $3, active = COALESCE($4, active)
            WHERE id = $5
            RETURNING {}
            "#,
            PLAN_COLUMNS
        ))
        .bind(update.price)
        .bind(update.image_quota)
        .bind(&update.checkout_url)
        .bind(update.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("plan config {}", id)))?;

        row.into_config()
    }
}
