use std::sync::Arc;

use crate::error::{MembershipError, Result};
use crate::plans::{ChangeIntent, ChangeKind, Plan, classify_change};
use crate::subscription::{Subscription, SubscriptionPatch, SubscriptionStore};

/// Access is always evaluated against the current plan. A pending
/// downgrade changes nothing until an external renewal process applies
/// it at `end_date`.
pub fn evaluate_access(subscription: Option<&Subscription>, required: Plan) -> bool {
    match subscription {
        Some(sub) => sub.plan.rank() >= required.rank(),
        None => false,
    }
}

/// Owns the request/defer/cancel transitions of a subscription.
/// Upgrades take effect immediately; downgrades are queued as a
/// pending change until `end_date`. Callers must adopt the returned
/// record as their new view; the in-memory argument is stale after any
/// mutating call.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn SubscriptionStore>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Classifies a requested change without mutating anything.
    pub fn request_plan_change(
        &self,
        subscription: &Subscription,
        target: Plan,
    ) -> Result<ChangeIntent> {
        match classify_change(subscription.plan, target) {
            ChangeKind::NoChange => Err(MembershipError::AlreadyOnPlan),
            kind => Ok(ChangeIntent::new(kind, subscription.plan, target)),
        }
    }

    /// First-payment path (demo mode): creates the active record.
    pub async fn start_subscription(&self, user_id: &str, plan: Plan) -> Result<Subscription> {
        if self.store.find_active_subscription(user_id).await?.is_some() {
            return Err(MembershipError::AlreadySubscribed);
        }
        let sub = self.store.create_subscription(user_id, plan).await?;
        tracing::info!(
            user_id = %sub.user_id,
            plan = plan.as_str(),
            "subscription started"
        );
        Ok(sub)
    }

    /// Persists `plan = target` on the existing record. Id and period
    /// boundaries are untouched. On a store error the stored row is
    /// unchanged and the caller sees the failure; there is no retry.
    pub async fn apply_upgrade(&self, subscription: &Subscription, target: Plan) -> Result<Subscription> {
        if classify_change(subscription.plan, target) == ChangeKind::NoChange {
            return Err(MembershipError::AlreadyOnPlan);
        }
        let patch = SubscriptionPatch {
            plan: Some(target),
            ..Default::default()
        };
        let updated = self
            .store
            .update_subscription(&subscription.id, patch)
            .await?
            .ok_or_else(|| MembershipError::NotFound("subscription not found".into()))?;
        tracing::info!(
            user_id = %updated.user_id,
            from = subscription.plan.as_str(),
            to = target.as_str(),
            "plan upgraded"
        );
        Ok(updated)
    }

    /// Queues `target` to take effect at `end_date`. The current plan
    /// keeps full access until then; this path never touches the
    /// external checkout flow.
    pub async fn apply_downgrade(
        &self,
        subscription: &Subscription,
        target: Plan,
    ) -> Result<Subscription> {
        if classify_change(subscription.plan, target) == ChangeKind::NoChange {
            return Err(MembershipError::AlreadyOnPlan);
        }
        let patch = SubscriptionPatch {
            pending_plan: Some(Some(target)),
            pending_change_date: Some(Some(subscription.end_date)),
            ..Default::default()
        };
        let updated = self
            .store
            .update_subscription(&subscription.id, patch)
            .await?
            .ok_or_else(|| MembershipError::NotFound("subscription not found".into()))?;
        tracing::info!(
            user_id = %updated.user_id,
            from = subscription.plan.as_str(),
            to = target.as_str(),
            effective = %subscription.end_date,
            "plan downgrade queued"
        );
        Ok(updated)
    }

    /// Clears a queued downgrade. Fails without mutation when nothing
    /// is pending.
    pub async fn cancel_pending_change(&self, subscription: &Subscription) -> Result<Subscription> {
        if subscription.pending_plan.is_none() {
            return Err(MembershipError::NoPendingChange);
        }
        let patch = SubscriptionPatch {
            pending_plan: Some(None),
            pending_change_date: Some(None),
            ..Default::default()
        };
        let updated = self
            .store
            .update_subscription(&subscription.id, patch)
            .await?
            .ok_or_else(|| MembershipError::NotFound("subscription not found".into()))?;
        tracing::info!(user_id = %updated.user_id, "pending plan change cancelled");
        Ok(updated)
    }
}
