use axum::{Json, extract::State, http::HeaderMap};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::{AccessTokenClaims, issue_access_token, jwt_ttl_secs, require_user};
use crate::error::{MembershipError, Result as AppResult};
use crate::server::AppState;
use crate::server::request_logging::log_simple_request;
use crate::users::{CreateUserPayload, User, verify_password};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_at: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub expires_at: String,
    pub user: AuthUser,
}

fn user_to_auth(user: &User) -> AuthUser {
    AuthUser {
        id: user.id.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
    }
}

fn login_response(user: &User) -> AppResult<LoginResponse> {
    let now = Utc::now();
    let exp = now + Duration::seconds(jwt_ttl_secs() as i64);
    let claims = AccessTokenClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        exp: exp.timestamp(),
        iat: Some(now.timestamp()),
    };
    let token = issue_access_token(&claims)?;
    Ok(LoginResponse {
        access_token: token,
        expires_at: exp.to_rfc3339(),
        user: user_to_auth(user),
    })
}

pub async fn register(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> AppResult<Json<LoginResponse>> {
    let start_time = Utc::now();

    let result = async {
        if payload.password.trim().len() < 6 {
            return Err(MembershipError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        let user = app_state.user_store.create_user(payload).await?;
        login_response(&user)
    }
    .await;

    let (status, error, user_id) = match &result {
        Ok(resp) => (200, None, Some(resp.user.id.clone())),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string()), None),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/auth/register",
        user_id.as_deref(),
        None,
        status,
        error,
    )
    .await;

    result.map(Json)
}

pub async fn login(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let start_time = Utc::now();

    let result = async {
        let record = app_state
            .user_store
            .find_auth_by_email(&payload.email)
            .await?
            .ok_or_else(|| MembershipError::Unauthorized("invalid credentials".into()))?;
        if !verify_password(&payload.password, &record.password_hash) {
            return Err(MembershipError::Unauthorized("invalid credentials".into()));
        }
        login_response(&record.user)
    }
    .await;

    let (status, error, user_id) = match &result {
        Ok(resp) => (200, None, Some(resp.user.id.clone())),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string()), None),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/auth/login",
        user_id.as_deref(),
        None,
        status,
        error,
    )
    .await;

    result.map(Json)
}

pub async fn me(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<MeResponse>> {
    let claims = require_user(&headers)?;
    let user = app_state
        .user_store
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| MembershipError::Unauthorized("invalid credentials".into()))?;
    let exp = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    Ok(Json(MeResponse {
        expires_at: exp.to_rfc3339(),
        user: user_to_auth(&user),
    }))
}
