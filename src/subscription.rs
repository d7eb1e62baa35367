use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MembershipError;
use crate::plans::Plan;

/// One user's membership. At most one active row per user; a missing
/// row means "no subscription".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Plan queued to take effect at `end_date`; always differs from
    /// `plan` when set.
    #[serde(default)]
    pub pending_plan: Option<Plan>,
    /// Equals `end_date` as of when the pending change was recorded.
    #[serde(default)]
    pub pending_change_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            _ => None,
        }
    }
}

/// Partial update for a subscription row. The pending fields use a
/// double `Option` so "leave unchanged" and "clear" stay distinct.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub plan: Option<Plan>,
    pub pending_plan: Option<Option<Plan>>,
    pub pending_change_date: Option<Option<DateTime<Utc>>>,
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_active_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<Subscription>, MembershipError>;

    /// Creates an active subscription starting now and ending 30 days
    /// from now.
    async fn create_subscription(
        &self,
        user_id: &str,
        plan: Plan,
    ) -> Result<Subscription, MembershipError>;

    async fn update_subscription(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Option<Subscription>, MembershipError>;
}
