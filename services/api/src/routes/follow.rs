//! Follow requests. Public targets are followed immediately; private
//! targets get a pending request the target must approve or deny.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use common::document::{FollowRequest, Follower, next_id};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowTargetRequest {
    pub target_id: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowDecisionRequest {
    pub request_id: Option<u64>,
}

pub async fn request(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<FollowTargetRequest>,
) -> ApiResult<impl IntoResponse> {
    let target_id = payload
        .target_id
        .ok_or_else(|| ApiError::Validation("targetId required".to_string()))?;
    if target_id == user_id {
        return Err(ApiError::Validation("cannot follow yourself".to_string()));
    }

    let outcome = state
        .store
        .update(|doc| {
            let target_private = doc
                .find_user(target_id)
                .map(|u| u.private)
                .ok_or(ApiError::NotFound)?;

            if doc.is_follower(target_id, user_id) {
                return Ok(json!({ "approved": true }));
            }

            if !target_private {
                doc.followers.push(Follower {
                    user_id: target_id,
                    follower_id: user_id,
                });
                doc.follow_requests
                    .retain(|r| !(r.from == user_id && r.to == target_id));
                return Ok(json!({ "approved": true }));
            }

            if let Some(existing) = doc
                .follow_requests
                .iter()
                .find(|r| r.from == user_id && r.to == target_id)
            {
                return Ok(json!({ "requested": true, "requestId": existing.id }));
            }
            let request = FollowRequest {
                id: next_id(&doc.follow_requests, |r| r.id),
                from: user_id,
                to: target_id,
                created_at: Utc::now(),
            };
            let request_id = request.id;
            doc.follow_requests.push(request);
            Ok::<_, ApiError>(json!({ "requested": true, "requestId": request_id }))
        })
        .await??;

    let status = if outcome.get("requested").is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// Approve a pending request. Only the request's target may approve.
pub async fn approve(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<FollowDecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let request_id = payload
        .request_id
        .ok_or_else(|| ApiError::Validation("requestId required".to_string()))?;

    state
        .store
        .update(|doc| {
            let request = doc
                .follow_requests
                .iter()
                .find(|r| r.id == request_id)
                .cloned()
                .ok_or(ApiError::NotFound)?;
            if request.to != user_id {
                return Err(ApiError::Forbidden);
            }

            if !doc.is_follower(request.to, request.from) {
                doc.followers.push(Follower {
                    user_id: request.to,
                    follower_id: request.from,
                });
            }
            doc.follow_requests.retain(|r| r.id != request_id);
            Ok(())
        })
        .await??;

    Ok(Json(json!({ "approved": true })))
}

pub async fn deny(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<FollowDecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let request_id = payload
        .request_id
        .ok_or_else(|| ApiError::Validation("requestId required".to_string()))?;

    state
        .store
        .update(|doc| {
            let request = doc
                .follow_requests
                .iter()
                .find(|r| r.id == request_id)
                .ok_or(ApiError::NotFound)?;
            if request.to != user_id {
                return Err(ApiError::Forbidden);
            }
            doc.follow_requests.retain(|r| r.id != request_id);
            Ok(())
        })
        .await??;

    Ok(Json(json!({ "denied": true })))
}
