//! Media attachments on memorial records: multipart file uploads
//! stored under the uploads directory, or external URL references.

use std::path::Path as FsPath;

use axum::{
    Json, RequestExt,
    extract::{Multipart, Path, State},
    http::{Request, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use common::document::{Media, next_id};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::parse_id;
use crate::state::AppState;
use crate::validation::validate_url;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalMediaRequest {
    url: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
}

/// Attach media to a record. Multipart bodies become stored files;
/// `application/json` bodies register an external URL instead.
pub async fn attach(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request<axum::body::Body>,
) -> ApiResult<impl IntoResponse> {
    let memorial_id = parse_id(&raw_id)?;

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    {
        let doc = state.store.read().await;
        if doc.find_memorial(memorial_id).is_none() {
            return Err(ApiError::NotFound);
        }
    }

    if content_type.starts_with("multipart/form-data") {
        let multipart: Multipart = req.extract().await.map_err(|e| {
            ApiError::Validation(format!("invalid multipart body: {e}"))
        })?;
        attach_upload(state, memorial_id, multipart).await
    } else if content_type.starts_with("application/json") {
        let bytes = axum::body::to_bytes(req.into_body(), crate::routes::UPLOAD_BODY_LIMIT)
            .await
            .map_err(|e| ApiError::Validation(format!("invalid body: {e}")))?;
        let payload: ExternalMediaRequest = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Validation(format!("invalid json: {e}")))?;
        attach_external(state, memorial_id, payload).await
    } else {
        Err(ApiError::UnsupportedMediaType(
            "expected multipart/form-data or application/json".to_string(),
        ))
    }
}

async fn attach_upload(
    state: AppState,
    memorial_id: u64,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_err)? {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(map_multipart_err)?;
        file = Some((filename, mimetype, bytes.to_vec()));
        break;
    }
    let (filename, mimetype, bytes) =
        file.ok_or_else(|| ApiError::Validation("file field required".to_string()))?;

    let extension = FsPath::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let stored_filename = format!("{}{}", Uuid::new_v4().simple(), extension);
    let stored_path = state.config.uploads_dir.join(&stored_filename);
    let size = bytes.len() as u64;

    tokio::fs::write(&stored_path, &bytes).await?;

    let result = state
        .store
        .update(|doc| {
            if doc.find_memorial(memorial_id).is_none() {
                return Err(ApiError::NotFound);
            }
            let media = Media {
                id: next_id(&doc.media, |m| m.id),
                memorial_id,
                external: false,
                url: Some(format!("/uploads/{stored_filename}")),
                media_type: None,
                filename: Some(filename.clone()),
                stored_filename: Some(stored_filename.clone()),
                size: Some(size),
                mimetype: Some(mimetype.clone()),
                created_at: Utc::now(),
            };
            doc.media.push(media.clone());
            Ok(media)
        })
        .await?;

    let media = match result {
        Ok(media) => media,
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(&stored_path).await {
                warn!("failed to remove orphaned upload {stored_filename}: {e}");
            }
            return Err(err);
        }
    };

    info!(
        "stored upload {} ({} bytes) for record {}",
        media.stored_filename.as_deref().unwrap_or("?"),
        size,
        memorial_id
    );
    Ok((StatusCode::CREATED, Json(media)))
}

async fn attach_external(
    state: AppState,
    memorial_id: u64,
    payload: ExternalMediaRequest,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let url = payload.url.unwrap_or_default();
    validate_url(&url).map_err(ApiError::Validation)?;

    let media = state
        .store
        .update(|doc| {
            if doc.find_memorial(memorial_id).is_none() {
                return Err(ApiError::NotFound);
            }
            let media = Media {
                id: next_id(&doc.media, |m| m.id),
                memorial_id,
                external: true,
                url: Some(url.clone()),
                media_type: payload.media_type.clone(),
                filename: None,
                stored_filename: None,
                size: None,
                mimetype: None,
                created_at: Utc::now(),
            };
            doc.media.push(media.clone());
            Ok(media)
        })
        .await??;

    Ok((StatusCode::CREATED, Json(media)))
}

/// List all media attached to a record.
pub async fn list(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let memorial_id = parse_id(&raw_id)?;
    let doc = state.store.read().await;
    if doc.find_memorial(memorial_id).is_none() {
        return Err(ApiError::NotFound);
    }
    let media: Vec<Media> = doc
        .memorial_media(memorial_id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(media))
}

fn map_multipart_err(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::Validation(format!("invalid multipart body: {e}"))
    }
}
