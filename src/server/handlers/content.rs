use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::require_user;
use crate::content::{ContentItem, ContentKind};
use crate::error::{MembershipError, Result as AppResult};
use crate::lifecycle::evaluate_access;
use crate::plans::Plan;
use crate::server::AppState;
use crate::subscription::Subscription;

/// A catalog entry as shown to one member. The media URL is withheld
/// for items above the member's tier; title and badge stay visible so
/// the item can be rendered locked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemView {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub required_plan: Plan,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn to_view(item: ContentItem, subscription: Option<&Subscription>) -> ContentItemView {
    let accessible = evaluate_access(subscription, item.required_plan);
    ContentItemView {
        id: item.id,
        kind: item.kind,
        title: item.title,
        description: item.description,
        thumbnail: item.thumbnail,
        required_plan: item.required_plan,
        accessible,
        url: accessible.then_some(item.url),
    }
}

pub async fn list_all(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    let claims = require_user(&headers)?;
    let subscription = app_state
        .subscription_store
        .find_active_subscription(&claims.sub)
        .await?;

    let items = app_state.content_store.list_content(None).await?;
    let mut videos = Vec::new();
    let mut documents = Vec::new();
    let mut images = Vec::new();
    for item in items {
        let view = to_view(item, subscription.as_ref());
        match view.kind {
            ContentKind::Video => videos.push(view),
            ContentKind::Document => documents.push(view),
            ContentKind::Image => images.push(view),
        }
    }

    Ok(Json(serde_json::json!({
        "videos": videos,
        "documents": documents,
        "images": images,
    })))
}

pub async fn list_kind(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let claims = require_user(&headers)?;
    let kind = ContentKind::parse(&kind)
        .ok_or_else(|| MembershipError::NotFound(format!("unknown content kind `{kind}`")))?;

    let subscription = app_state
        .subscription_store
        .find_active_subscription(&claims.sub)
        .await?;
    let items = app_state.content_store.list_content(Some(kind)).await?;
    let views: Vec<ContentItemView> = items
        .into_iter()
        .map(|item| to_view(item, subscription.as_ref()))
        .collect();

    Ok(Json(serde_json::json!({ "items": views })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{LoggingConfig, Settings};
    use crate::content::demo_catalog;
    use crate::lifecycle::LifecycleManager;
    use crate::logging::Database;
    use crate::server::handlers::auth::{AccessTokenClaims, issue_access_token};
    use crate::users::{CreateUserPayload, UserStore};
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn seeded_state(db_path: String) -> Arc<AppState> {
        let db = Arc::new(Database::new(&db_path).await.unwrap());
        db.seed_content(&demo_catalog()).await.unwrap();
        Arc::new(AppState {
            config: Settings {
                server: Default::default(),
                logging: LoggingConfig {
                    database_path: db_path,
                },
                checkout: None,
            },
            log_store: db.clone(),
            user_store: db.clone(),
            subscription_store: db.clone(),
            content_store: db.clone(),
            lifecycle: LifecycleManager::new(db),
            checkout: None,
        })
    }

    async fn member_headers(app_state: &AppState, plan: Option<Plan>) -> HeaderMap {
        unsafe {
            std::env::set_var("MS_JWT_SECRET", "testsecret");
        }
        let user = app_state
            .user_store
            .create_user(CreateUserPayload {
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                password: "secret123".into(),
                full_name: None,
            })
            .await
            .unwrap();
        if let Some(plan) = plan {
            app_state
                .lifecycle
                .start_subscription(&user.id, plan)
                .await
                .unwrap();
        }

        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id,
            email: user.email,
            exp: (now + Duration::minutes(30)).timestamp(),
            iat: Some(now.timestamp()),
        };
        let token = issue_access_token(&claims).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn without_subscription_everything_is_locked() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let app_state = seeded_state(db_path.to_str().unwrap().to_string()).await;
        let headers = member_headers(&app_state, None).await;

        let Json(out) = list_all(State(app_state), headers).await.unwrap();
        for group in ["videos", "documents", "images"] {
            for item in out[group].as_array().unwrap() {
                assert_eq!(item["accessible"], false);
                assert!(item["url"].is_null());
            }
        }
    }

    #[tokio::test]
    async fn elite_member_sees_every_url() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let app_state = seeded_state(db_path.to_str().unwrap().to_string()).await;
        let headers = member_headers(&app_state, Some(Plan::Elite)).await;

        let Json(out) = list_all(State(app_state), headers).await.unwrap();
        for group in ["videos", "documents", "images"] {
            for item in out[group].as_array().unwrap() {
                assert_eq!(item["accessible"], true);
                assert!(item["url"].is_string());
            }
        }
    }

    #[tokio::test]
    async fn basic_member_is_locked_out_of_higher_tiers() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let app_state = seeded_state(db_path.to_str().unwrap().to_string()).await;
        let headers = member_headers(&app_state, Some(Plan::Basic)).await;

        let Json(out) = list_kind(State(app_state), headers, Path("document".into()))
            .await
            .unwrap();
        let items = out["items"].as_array().unwrap();
        assert!(!items.is_empty());
        for item in items {
            let accessible = item["accessible"].as_bool().unwrap();
            assert_eq!(accessible, item["requiredPlan"] == "basic");
        }
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let app_state = seeded_state(db_path.to_str().unwrap().to_string()).await;
        let headers = member_headers(&app_state, Some(Plan::Basic)).await;

        let err = list_kind(State(app_state), headers, Path("podcast".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)));
    }
}
