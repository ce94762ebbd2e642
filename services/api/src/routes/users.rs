//! Account endpoints: signup, login, profile, password reset, blocking

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::document::{Block, Session, User, next_id};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::crypto;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, parse_id};
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::validation::validate_username;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub target_id: Option<u64>,
}

/// Register a new account.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "username and password required".to_string(),
        ));
    }
    validate_username(&username).map_err(ApiError::Validation)?;

    let stored = crypto::hash_password(&password);
    let created = state
        .store
        .update(|doc| {
            if doc.find_user_by_username(&username).is_some() {
                return Err(ApiError::UsernameTaken);
            }
            let user = User {
                id: next_id(&doc.users, |u| u.id),
                username: username.clone(),
                password: stored.clone(),
                created_at: Utc::now(),
                private: payload.private,
                suspended: false,
                admin: false,
            };
            doc.users.push(user.clone());
            Ok(user)
        })
        .await??;

    info!("registered user {} (id {})", created.username, created.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": created.id,
            "username": created.username,
            "createdAt": created.created_at,
        })),
    ))
}

/// Log in, returning a signed bearer token. A session row with an
/// opaque refresh handle is recorded alongside.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "username and password required".to_string(),
        ));
    }

    let token_secret = state.config.token_secret.clone();
    let ttl = state.config.token_ttl_secs;
    let access = state
        .store
        .update(|doc| {
            let (user_id, stored) = doc
                .find_user_by_username(&username)
                .map(|u| (u.id, u.password.clone()))
                .ok_or(ApiError::Unauthorized)?;
            if !crypto::verify_password(&password, &stored) {
                return Err(ApiError::Unauthorized);
            }

            let access = crypto::sign_token(&token_secret, user_id, ttl);
            doc.sessions.push(Session {
                token: crypto::random_hex(16),
                access: access.clone(),
                user_id,
                created_at: Utc::now(),
            });
            Ok(access)
        })
        .await??;

    Ok(Json(json!({ "token": access })))
}

/// Public profile by id. Never exposes the stored password.
pub async fn profile(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let doc = state.store.read().await;
    let user = doc.find_user(id).ok_or(ApiError::NotFound)?;

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "createdAt": user.created_at,
        "private": user.private,
        "suspended": user.suspended,
    })))
}

/// Change the caller's password after verifying the old one.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(old_password), Some(new_password)) = (payload.old_password, payload.new_password)
    else {
        return Err(ApiError::Validation(
            "oldPassword and newPassword required".to_string(),
        ));
    };
    if new_password.is_empty() {
        return Err(ApiError::Validation("newPassword required".to_string()));
    }

    let stored = crypto::hash_password(&new_password);
    state
        .store
        .update(|doc| {
            let user = doc.find_user_mut(user_id).ok_or(ApiError::Unauthorized)?;
            if !crypto::verify_password(&old_password, &user.password) {
                return Err(ApiError::Unauthorized);
            }
            user.password = stored.clone();
            Ok(())
        })
        .await??;

    Ok(Json(json!({ "success": true })))
}

/// Block a user. Enforcement is bidirectional regardless of which side
/// created the edge.
pub async fn block(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<BlockRequest>,
) -> ApiResult<impl IntoResponse> {
    let target_id = payload
        .target_id
        .ok_or_else(|| ApiError::Validation("targetId required".to_string()))?;
    if target_id == user_id {
        return Err(ApiError::Validation("cannot block yourself".to_string()));
    }

    state
        .store
        .update(|doc| {
            if doc.find_user(target_id).is_none() {
                return Err(ApiError::NotFound);
            }
            let exists = doc
                .blocks
                .iter()
                .any(|b| b.by_user_id == user_id && b.blocked_user_id == target_id);
            if !exists {
                doc.blocks.push(Block {
                    by_user_id: user_id,
                    blocked_user_id: target_id,
                    created_at: Utc::now(),
                });
            }
            Ok(())
        })
        .await??;

    Ok(Json(json!({ "blocked": true })))
}

/// Remove the caller's block edge against a user.
pub async fn unblock(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<BlockRequest>,
) -> ApiResult<impl IntoResponse> {
    let target_id = payload
        .target_id
        .ok_or_else(|| ApiError::Validation("targetId required".to_string()))?;

    state
        .store
        .update(|doc| {
            if doc.find_user(target_id).is_none() {
                return Err(ApiError::NotFound);
            }
            doc.blocks
                .retain(|b| !(b.by_user_id == user_id && b.blocked_user_id == target_id));
            Ok(())
        })
        .await??;

    Ok(Json(json!({ "blocked": false })))
}
