use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::StoreError;
use crate::models::generation::SubscriptionPlan;
use crate::models::profile::{AccountStatus, UserProfile};

/// Estimated provider cost of one generated image (0.22), in the plan price currency.
pub fn image_cost_estimate() -> Decimal {
    Decimal::new(22, 2)
}

/// Per-plan commercial settings editable from the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanConfigRow {
    pub id: i32,
    pub plan_name: String,
    pub price: Decimal,
    pub image_quota: i32,
    pub checkout_url: Option<String>,
    pub active: bool,
}

impl PlanConfigRow {
    pub fn into_config(self) -> Result<PlanConfig, StoreError> {
        let plan_name = self
            .plan_name
            .parse::<SubscriptionPlan>()
            .map_err(|_| StoreError::invalid_value("plan_name", &self.plan_name))?;
        Ok(PlanConfig {
            id: self.id,
            plan_name,
            price: self.price,
            image_quota: self.image_quota,
            checkout_url: self.checkout_url,
            active: self.active,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub id: i32,
    pub plan_name: SubscriptionPlan,
    pub price: Decimal,
    pub image_quota: i32,
    pub checkout_url: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfigUpdate {
    pub price: Decimal,
    pub image_quota: i32,
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AdminStats {
    pub total_users: usize,
    pub active_users: usize,
    pub scripts_generated: i64,
    pub images_generated: i64,
    pub estimated_monthly_revenue: Decimal,
    pub estimated_image_cost: Decimal,
    pub estimated_profit: Decimal,
}

impl AdminStats {
    /// Revenue counts the plan price of every active account.
    pub fn compute(profiles: &[UserProfile], plans: &[PlanConfig]) -> Self {
        let active: Vec<&UserProfile> = profiles.iter().filter(|p| p.is_active()).collect();
        let images_generated: i64 = profiles.iter().map(|p| p.image_credits_used as i64).sum();
        let revenue: Decimal = active
            .iter()
            .filter_map(|p| plans.iter().find(|c| c.plan_name == p.plan))
            .map(|c| c.price)
            .sum();
        let cost = image_cost_estimate() * Decimal::from(images_generated);

        AdminStats {
            total_users: profiles.len(),
            active_users: active.len(),
            scripts_generated: profiles.iter().map(|p| p.credits_used as i64).sum(),
            images_generated,
            estimated_monthly_revenue: revenue,
            estimated_image_cost: cost,
            estimated_profit: revenue - cost,
        }
    }
}

/// Script credits granted to a freshly created account.
pub fn default_script_credits(plan: SubscriptionPlan) -> i32 {
    match plan {
        SubscriptionPlan::Professional => 9999,
        _ => 50,
    }
}

/// Image credits granted for a plan, from its configuration row when present.
pub fn image_quota_for(plan: SubscriptionPlan, configs: &[PlanConfig]) -> i32 {
    configs
        .iter()
        .find(|c| c.plan_name == plan)
        .map(|c| c.image_quota)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(plan: SubscriptionPlan, quota: i32) -> PlanConfig {
        PlanConfig {
            id: 1,
            plan_name: plan,
            price: Decimal::new(4990, 2),
            image_quota: quota,
            checkout_url: None,
            active: true,
        }
    }

    #[test]
    fn test_default_script_credits() {
        assert_eq!(default_script_credits(SubscriptionPlan::Professional), 9999);
        assert_eq!(default_script_credits(SubscriptionPlan::Basic), 50);
        assert_eq!(default_script_credits(SubscriptionPlan::Free), 50);
    }

    #[test]
    fn test_stats() {
        use crate::models::profile::UserRole;
        use crate::test_support::profile;

        let configs = vec![
            config(SubscriptionPlan::Basic, 30),
            PlanConfig {
                price: Decimal::new(9790, 2),
                ..config(SubscriptionPlan::Professional, 100)
            },
        ];
        let mut basic = profile(SubscriptionPlan::Basic, UserRole::User);
        basic.credits_used = 4;
        basic.image_credits_used = 10;
        let mut pro = profile(SubscriptionPlan::Professional, UserRole::User);
        pro.status = AccountStatus::Refunded;
        pro.image_credits_used = 5;
        let free = profile(SubscriptionPlan::Free, UserRole::User);

        let stats = AdminStats::compute(&[basic, pro, free], &configs);
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.scripts_generated, 4);
        assert_eq!(stats.images_generated, 15);
        assert_eq!(stats.estimated_monthly_revenue, Decimal::new(4990, 2));
        assert_eq!(stats.estimated_image_cost, Decimal::new(330, 2));
        assert_eq!(stats.estimated_profit, Decimal::new(4660, 2));
    }

    #[test]
    fn test_image_quota_lookup() {
        let configs = vec![
            config(SubscriptionPlan::Basic, 30),
            config(SubscriptionPlan::Professional, 100),
        ];
        assert_eq!(image_quota_for(SubscriptionPlan::Basic, &configs), 30);
        assert_eq!(image_quota_for(SubscriptionPlan::Free, &configs), 0);
    }
}
