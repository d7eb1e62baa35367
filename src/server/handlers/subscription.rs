use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::require_user;
use crate::checkout::CheckoutSessionRequest;
use crate::error::{MembershipError, Result as AppResult};
use crate::plans::{ChangeKind, Plan};
use crate::server::AppState;
use crate::server::request_logging::log_simple_request;
use crate::subscription::Subscription;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub plan: Plan,
}

/// Static tier catalog, public so the pricing page needs no session.
pub async fn list_plans() -> Json<serde_json::Value> {
    let plans: Vec<serde_json::Value> = Plan::ALL
        .iter()
        .map(|p| {
            let info = p.info();
            serde_json::json!({
                "plan": p,
                "name": info.name,
                "monthlyPriceEur": info.monthly_price_eur,
            })
        })
        .collect();
    Json(serde_json::json!({ "plans": plans }))
}

pub async fn get_subscription(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    let claims = require_user(&headers)?;
    let subscription = app_state
        .subscription_store
        .find_active_subscription(&claims.sub)
        .await?;
    Ok(Json(serde_json::json!({ "subscription": subscription })))
}

async fn active_subscription_required(
    app_state: &AppState,
    user_id: &str,
) -> AppResult<Subscription> {
    app_state
        .subscription_store
        .find_active_subscription(user_id)
        .await?
        .ok_or_else(|| MembershipError::NotFound("no active subscription".into()))
}

/// First-time purchase. With a processor configured this only hands
/// back a redirect URL; the subscription record is written by a later
/// reconciliation step, not here. Demo mode creates it synchronously.
pub async fn subscribe(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PlanRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let start_time = Utc::now();
    let claims = match require_user(&headers) {
        Ok(v) => v,
        Err(e) => {
            log_simple_request(
                &app_state,
                start_time,
                "POST",
                "/subscription/subscribe",
                None,
                Some(payload.plan.as_str()),
                e.status_code().as_u16(),
                Some(e.to_string()),
            )
            .await;
            return Err(e);
        }
    };

    let result = async {
        if let Some(gateway) = &app_state.checkout {
            if app_state
                .subscription_store
                .find_active_subscription(&claims.sub)
                .await?
                .is_some()
            {
                return Err(MembershipError::AlreadySubscribed);
            }
            let url = gateway
                .create_checkout_session(&CheckoutSessionRequest {
                    plan: payload.plan,
                    customer_email: claims.email.clone(),
                    client_reference_id: claims.sub.clone(),
                })
                .await?;
            Ok(serde_json::json!({ "checkoutUrl": url }))
        } else {
            let subscription = app_state
                .lifecycle
                .start_subscription(&claims.sub, payload.plan)
                .await?;
            Ok(serde_json::json!({ "subscription": subscription }))
        }
    }
    .await;

    let (status, error) = match &result {
        Ok(_) => (200, None),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string())),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/subscription/subscribe",
        Some(claims.sub.as_str()),
        Some(payload.plan.as_str()),
        status,
        error,
    )
    .await;

    result.map(Json)
}

/// Dry run: classifies the change and quotes the price delta without
/// touching any state.
pub async fn preview_change(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PlanRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let claims = require_user(&headers)?;
    let subscription = active_subscription_required(&app_state, &claims.sub).await?;
    let intent = app_state
        .lifecycle
        .request_plan_change(&subscription, payload.plan)?;
    Ok(Json(serde_json::json!({ "intent": intent })))
}

/// Applies a plan change. Upgrades take effect immediately (or hand
/// back a checkout redirect when a processor is configured); a
/// downgrade is always deferred to the end of the paid period.
pub async fn change_plan(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PlanRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let start_time = Utc::now();
    let claims = match require_user(&headers) {
        Ok(v) => v,
        Err(e) => {
            log_simple_request(
                &app_state,
                start_time,
                "POST",
                "/subscription/change",
                None,
                Some(payload.plan.as_str()),
                e.status_code().as_u16(),
                Some(e.to_string()),
            )
            .await;
            return Err(e);
        }
    };

    let result = async {
        let subscription = active_subscription_required(&app_state, &claims.sub).await?;
        let intent = app_state
            .lifecycle
            .request_plan_change(&subscription, payload.plan)?;

        match intent.kind {
            ChangeKind::Upgrade => {
                if let Some(gateway) = &app_state.checkout {
                    let url = gateway
                        .create_checkout_session(&CheckoutSessionRequest {
                            plan: payload.plan,
                            customer_email: claims.email.clone(),
                            client_reference_id: claims.sub.clone(),
                        })
                        .await?;
                    Ok(serde_json::json!({ "intent": intent, "checkoutUrl": url }))
                } else {
                    let updated = app_state
                        .lifecycle
                        .apply_upgrade(&subscription, payload.plan)
                        .await?;
                    Ok(serde_json::json!({ "intent": intent, "subscription": updated }))
                }
            }
            ChangeKind::Downgrade => {
                let updated = app_state
                    .lifecycle
                    .apply_downgrade(&subscription, payload.plan)
                    .await?;
                Ok(serde_json::json!({ "intent": intent, "subscription": updated }))
            }
            ChangeKind::NoChange => Err(MembershipError::AlreadyOnPlan),
        }
    }
    .await;

    let (status, error) = match &result {
        Ok(_) => (200, None),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string())),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/subscription/change",
        Some(claims.sub.as_str()),
        Some(payload.plan.as_str()),
        status,
        error,
    )
    .await;

    result.map(Json)
}

pub async fn cancel_pending(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    let start_time = Utc::now();
    let claims = match require_user(&headers) {
        Ok(v) => v,
        Err(e) => {
            log_simple_request(
                &app_state,
                start_time,
                "POST",
                "/subscription/pending/cancel",
                None,
                None,
                e.status_code().as_u16(),
                Some(e.to_string()),
            )
            .await;
            return Err(e);
        }
    };

    let result: AppResult<serde_json::Value> = async {
        let subscription = active_subscription_required(&app_state, &claims.sub).await?;
        let updated = app_state
            .lifecycle
            .cancel_pending_change(&subscription)
            .await?;
        Ok(serde_json::json!({ "subscription": updated }))
    }
    .await;

    let (status, error) = match &result {
        Ok(_) => (200, None),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string())),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/subscription/pending/cancel",
        Some(claims.sub.as_str()),
        None,
        status,
        error,
    )
    .await;

    result.map(Json)
}
