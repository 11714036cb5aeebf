// src/store/memory.rs
// In-process stores with the same observable behavior as the Postgres ones.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::admin::{PlanConfig, PlanConfigUpdate};
use crate::models::generation::SubscriptionPlan;
use crate::models::history::{SavedIdea, HISTORY_LIMIT};
use crate::models::profile::{NewProfile, ProfileUpdate, UserProfile};
use crate::store::{HistoryStore, PlanStore, ProfileStore};

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<Vec<(UserProfile, String)>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile with a password hash and return it.
    pub fn insert(&self, mut profile: UserProfile, password_hash: &str) -> UserProfile {
        profile.email = profile.email.to_lowercase();
        self.rows
            .lock()
            .unwrap()
            .push((profile.clone(), password_hash.to_string()));
        profile
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<(UserProfile, String)>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(p, _)| p.clone()))
    }

    async fn update(&self, id: Uuid, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let (profile, _) = rows
            .iter_mut()
            .find(|(p, _)| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;
        update.apply_to(profile);
        Ok(profile.clone())
    }

    async fn upsert_by_email(&self, new: &NewProfile) -> Result<UserProfile, StoreError> {
        let email = new.email.trim().to_lowercase();
        let mut rows = self.rows.lock().unwrap();
        if let Some((profile, hash)) = rows.iter_mut().find(|(p, _)| p.email == email) {
            profile.role = new.role;
            profile.plan = new.plan;
            profile.status = new.status;
            profile.credits_total = new.credits_total;
            profile.credits_used = 0;
            profile.image_credits_total = new.image_credits_total;
            profile.image_credits_used = 0;
            *hash = new.password_hash.clone();
            return Ok(profile.clone());
        }

        let profile = UserProfile {
            id: Uuid::new_v4(),
            email,
            role: new.role,
            plan: new.plan,
            status: new.status,
            credits_total: new.credits_total,
            credits_used: 0,
            image_credits_total: new.image_credits_total,
            image_credits_used: 0,
            last_login: None,
        };
        rows.push((profile.clone(), new.password_hash.clone()));
        Ok(profile)
    }

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(p, _)| p.id != id);
        Ok(rows.len() < before)
    }
}

/// Entries per user, oldest first.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<HashMap<Uuid, Vec<SavedIdea>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SavedIdea>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(HISTORY_LIMIT as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, user_id: Uuid, entry: &SavedIdea) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let list = entries.entry(user_id).or_default();
        list.retain(|e| e.id() != entry.id());
        list.push(entry.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(list) = entries.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|e| e.id() != id);
        Ok(list.len() < before)
    }
}

pub struct MemoryPlanStore {
    plans: Mutex<Vec<PlanConfig>>,
}

impl MemoryPlanStore {
    /// The same three rows the initial migration seeds.
    pub fn seeded() -> Self {
        let plan = |id, plan_name, price, image_quota| PlanConfig {
            id,
            plan_name,
            price: Decimal::new(price, 2),
            image_quota,
            checkout_url: None,
            active: true,
        };
        Self {
            plans: Mutex::new(vec![
                plan(1, SubscriptionPlan::Free, 0, 0),
                plan(2, SubscriptionPlan::Basic, 4990, 30),
                plan(3, SubscriptionPlan::Professional, 9790, 100),
            ]),
        }
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn list(&self) -> Result<Vec<PlanConfig>, StoreError> {
        Ok(self.plans.lock().unwrap().clone())
    }

    async fn update(&self, id: i32, update: &PlanConfigUpdate) -> Result<PlanConfig, StoreError> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("plan config {}", id)))?;
        plan.price = update.price;
        plan.image_quota = update.image_quota;
        plan.checkout_url = update.checkout_url.clone();
        if let Some(active) = update.active {
            plan.active = active;
        }
        Ok(plan.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(id: &str) -> SavedIdea {
        serde_json::from_value(serde_json::json!({
            "id": id, "title": format!("Ideia {}", id), "description": "d"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_capped() {
        let store = MemoryHistoryStore::new();
        let user = Uuid::new_v4();
        for i in 0..60 {
            store.upsert(user, &saved(&i.to_string())).await.unwrap();
        }
        let listed = store.list_by_user(user).await.unwrap();
        assert_eq!(listed.len(), 50);
        assert_eq!(listed[0].id(), "59");

        // Re-saving moves the entry to the front without duplicating it.
        store.upsert(user, &saved("10")).await.unwrap();
        let listed = store.list_by_user(user).await.unwrap();
        assert_eq!(listed[0].id(), "10");
        assert_eq!(listed.iter().filter(|e| e.id() == "10").count(), 1);
    }

    #[tokio::test]
    async fn test_history_delete_is_scoped_to_user() {
        let store = MemoryHistoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.upsert(alice, &saved("a")).await.unwrap();
        assert!(!store.delete(bob, "a").await.unwrap());
        assert!(store.delete(alice, "a").await.unwrap());
        assert!(store.list_by_user(alice).await.unwrap().is_empty());
    }
}
