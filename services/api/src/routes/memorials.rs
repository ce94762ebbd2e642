//! Memorial record CRUD. `/api/records` and `/api/memorials` share
//! these handlers and operate on the same collection.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use common::document::{Memorial, next_id};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, parse_id};
use crate::middleware::identity_from_headers;
use crate::state::AppState;
use crate::visibility::{can_view_memorial, check_memorial_mutation};

#[derive(Deserialize)]
pub struct CreateMemorialRequest {
    pub name: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemorialRequest {
    pub name: Option<String>,
    pub note: Option<String>,
    pub private: Option<bool>,
    pub tags: Option<Vec<String>>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateMemorialRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = payload.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name required".to_string()));
    }
    let owner = identity_from_headers(&state, &headers).await;

    let created = state
        .store
        .update(|doc| {
            let memorial = Memorial {
                id: next_id(&doc.memorials, |m| m.id),
                name: name.clone(),
                note: payload.note.clone().unwrap_or_default(),
                owner,
                private: payload.private,
                tags: payload.tags.clone(),
                created_at: Utc::now(),
                updated_at: None,
            };
            doc.memorials.push(memorial.clone());
            Ok::<_, ApiError>(memorial)
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
    let visible: Vec<Memorial> = doc
        .memorials
        .iter()
        .filter(|m| can_view_memorial(&doc, &state.config, viewer, m))
        .cloned()
        .collect();
    Ok(Json(visible))
}

/// Fetch one record together with its attached media.
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let viewer = identity_from_headers(&state, &headers).await;
    let doc = state.store.read().await;
    let memorial = doc.find_memorial(id).ok_or(ApiError::NotFound)?;
    if !can_view_memorial(&doc, &state.config, viewer, memorial) {
        return Err(ApiError::NotFound);
    }

    let mut body = serde_json::to_value(memorial)?;
    body["media"] = serde_json::to_value(doc.memorial_media(id))?;
    Ok(Json(body))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateMemorialRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let viewer = identity_from_headers(&state, &headers).await;

    let updated = state
        .store
        .update(|doc| {
            check_memorial_mutation(doc, viewer, id).into_result()?;

            let memorial = doc.find_memorial_mut(id).ok_or(ApiError::NotFound)?;
            if let Some(name) = &payload.name {
                if name.trim().is_empty() {
                    return Err(ApiError::Validation("name required".to_string()));
                }
                memorial.name = name.clone();
            }
            if let Some(note) = &payload.note {
                memorial.note = note.clone();
            }
            if let Some(private) = payload.private {
                memorial.private = private;
            }
            if let Some(tags) = &payload.tags {
                memorial.tags = tags.clone();
            }
            memorial.updated_at = Some(Utc::now());
            Ok(memorial.clone())
        })
        .await??;

    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&raw_id)?;
    let viewer = identity_from_headers(&state, &headers).await;

    let removed = state
        .store
        .update(|doc| {
            check_memorial_mutation(doc, viewer, id).into_result()?;

            let idx = doc
                .memorials
                .iter()
                .position(|m| m.id == id)
                .ok_or(ApiError::NotFound)?;
            Ok::<_, ApiError>(doc.memorials.remove(idx))
        })
        .await??;

    Ok(Json(json!({ "deleted": true, "record": removed })))
}
