//! Text posts with tags and mentions, filtered by the visibility rules.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use common::document::{Post, next_id};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, parse_id};
use crate::middleware::identity_from_headers;
use crate::state::AppState;
use crate::validation::validate_url;
use crate::visibility::{can_view_post, ensure_not_suspended, visible_posts};

const MAX_TAGS: usize = 10;
const MAX_MENTIONS: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_id = identity_from_headers(&state, &headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let title = payload.title.unwrap_or_default();
    let body = payload.body.unwrap_or_default();
    if title.trim().is_empty() && body.trim().is_empty() {
        return Err(ApiError::Validation("title or body required".to_string()));
    }
    if payload.tags.len() > MAX_TAGS {
        return Err(ApiError::Validation("too many tags".to_string()));
    }
    if payload.mentions.len() > MAX_MENTIONS {
        return Err(ApiError::Validation("too many mentions".to_string()));
    }
    if let Some(url) = payload.video_url.as_deref() {
        if !url.is_empty() {
            validate_url(url).map_err(ApiError::Validation)?;
        }
    }

    let created = state
        .store
        .update(|doc| {
            ensure_not_suspended(doc, user_id)?;
            let post = Post {
                id: next_id(&doc.posts, |p| p.id),
                user_id,
                title: title.clone(),
                body: body.clone(),
                video_url: payload.video_url.clone().unwrap_or_default(),
                tags: payload.tags.clone(),
                mentions: payload.mentions.clone(),
                created_at: Utc::now(),
            };
            doc.posts.push(post.clone());
            Ok::<_, ApiError>(post)
        })
        .await??;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let viewer = identity_from_headers(&state, &headers).await;
    let doc = state.store.read().await;
    let posts: Vec<Post> = visible_posts(&doc, viewer).into_iter().cloned().collect();
    Ok(Json(posts))
}

/// Fetch one post. Posts hidden from the viewer read as missing.
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let viewer = identity_from_headers(&state, &headers).await;
    let doc = state.store.read().await;
    let post = doc
        .posts
        .iter()
        .find(|p| p.id == id)
        .ok_or(ApiError::NotFound)?;
    if !can_view_post(&doc, viewer, post) {
        return Err(ApiError::NotFound);
    }
    Ok(Json(post.clone()))
}
