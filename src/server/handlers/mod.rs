use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

pub(crate) mod auth;
mod auth_jwt;
mod content;
mod subscription;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts
        .route("/auth/register", post(auth_jwt::register))
        .route("/auth/login", post(auth_jwt::login))
        .route("/auth/me", get(auth_jwt::me))
        // Plans and subscription lifecycle
        .route("/plans", get(subscription::list_plans))
        .route("/subscription", get(subscription::get_subscription))
        .route("/subscription/subscribe", post(subscription::subscribe))
        .route(
            "/subscription/change/preview",
            post(subscription::preview_change),
        )
        .route("/subscription/change", post(subscription::change_plan))
        .route(
            "/subscription/pending/cancel",
            post(subscription::cancel_pending),
        )
        // Gated media library
        .route("/content", get(content::list_all))
        .route("/content/{kind}", get(content::list_kind))
}
