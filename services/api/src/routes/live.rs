//! Live stream keys. One active key per user; stopping is idempotent.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use common::document::LiveEntry;
use serde_json::json;

use crate::crypto::random_hex;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn start(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    // Starting again replaces any existing entry with a fresh key.
    let stream_key = random_hex(12);
    state
        .store
        .update(|doc| {
            doc.live.insert(
                user_id,
                LiveEntry {
                    stream_key: stream_key.clone(),
                    started_at: Utc::now(),
                },
            );
            Ok::<_, ApiError>(())
        })
        .await??;

    Ok(Json(json!({ "streamKey": stream_key })))
}

pub async fn stop(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let stopped = state
        .store
        .update(|doc| Ok::<_, ApiError>(doc.live.remove(&user_id).is_some()))
        .await??;

    Ok(Json(json!({ "stopped": stopped })))
}
