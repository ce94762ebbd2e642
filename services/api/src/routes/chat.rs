//! Room chat: message send plus a server-sent-events stream per room.

use std::collections::HashSet;
use std::convert::Infallible;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Sse,
        sse::{Event, KeepAlive},
    },
};
use chrono::Utc;
use common::document::{ChatMessage, next_id};
use serde::Deserialize;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::{identity_from_headers, identity_from_token};
use crate::state::AppState;
use crate::visibility::ensure_not_suspended;

const DEFAULT_ROOM: &str = "main";
const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Deserialize)]
pub struct StreamQuery {
    pub room: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct SendQuery {
    pub room: Option<String>,
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub user: Option<String>,
    pub message: Option<String>,
}

/// Subscribe to a room's message stream. Messages from users blocked
/// against the viewer (as of connect time) are filtered out.
pub async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StreamQuery>,
) -> ApiResult<impl IntoResponse> {
    let room = query.room.unwrap_or_else(|| DEFAULT_ROOM.to_string());

    let mut viewer = identity_from_headers(&state, &headers).await;
    if viewer.is_none() {
        if let Some(token) = &query.token {
            viewer = identity_from_token(&state, token).await;
        }
    }

    let hidden: HashSet<u64> = match viewer {
        Some(viewer_id) => {
            let doc = state.store.read().await;
            doc.blocks
                .iter()
                .filter_map(|b| {
                    if b.by_user_id == viewer_id {
                        Some(b.blocked_user_id)
                    } else if b.blocked_user_id == viewer_id {
                        Some(b.by_user_id)
                    } else {
                        None
                    }
                })
                .collect()
        }
        None => HashSet::new(),
    };

    let rx = state.chat.subscribe(&room).await;
    let events = BroadcastStream::new(rx).filter_map(move |msg| {
        let msg = msg.ok()?;
        if let Some(sender_id) = msg.sender_id {
            if hidden.contains(&sender_id) {
                return None;
            }
        }
        let event = Event::default().event("message").json_data(&msg).ok()?;
        Some(Ok::<_, Infallible>(event))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Post a message to a room. Anonymous senders are allowed; senders
/// with a valid token are linked to their account and must not be
/// suspended.
pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SendQuery>,
    ApiJson(payload): ApiJson<SendRequest>,
) -> ApiResult<impl IntoResponse> {
    let room = query.room.unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let user = payload.user.unwrap_or_default();
    let message = payload.message.unwrap_or_default();
    if user.trim().is_empty() || message.trim().is_empty() {
        return Err(ApiError::Validation("user and message required".to_string()));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::Validation("message too long".to_string()));
    }

    let sender_id = identity_from_headers(&state, &headers).await;

    let saved = state
        .store
        .update(|doc| {
            if let Some(sender_id) = sender_id {
                ensure_not_suspended(doc, sender_id)?;
            }
            let msg = ChatMessage {
                id: next_id(&doc.chat, |m| m.id),
                user: user.clone(),
                sender_id,
                message: message.clone(),
                room: room.clone(),
                created_at: Utc::now(),
            };
            doc.chat.push(msg.clone());
            Ok::<_, ApiError>(msg)
        })
        .await??;

    state.chat.publish(&saved).await;
    Ok((StatusCode::CREATED, Json(saved)))
}
