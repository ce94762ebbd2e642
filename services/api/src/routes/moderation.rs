//! User reports and the admin surface that acts on them.

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use common::document::{Report, next_id};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::{CurrentUser, identity_from_headers};
use crate::state::AppState;
use crate::visibility::admin_gate;

const REPORT_CATEGORIES: [&str; 5] = [
    "harassment",
    "spam",
    "impersonation",
    "inappropriate",
    "other",
];
const MAX_DETAIL_LEN: usize = 2000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub target_user_id: Option<u64>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub detail: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportActionRequest {
    pub action: Option<String>,
    pub report_id: Option<u64>,
    pub admin_secret: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub target_user_id: Option<u64>,
    pub admin_secret: Option<String>,
}

fn header_secret(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-admin-secret")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub async fn report(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let target_user_id = payload
        .target_user_id
        .ok_or_else(|| ApiError::Validation("targetUserId required".to_string()))?;
    if payload.categories.is_empty() {
        return Err(ApiError::Validation(
            "at least one category required".to_string(),
        ));
    }
    for category in &payload.categories {
        if !REPORT_CATEGORIES.contains(&category.as_str()) {
            return Err(ApiError::Validation(format!(
                "unknown category: {category}"
            )));
        }
    }
    if payload.detail.len() > MAX_DETAIL_LEN {
        return Err(ApiError::Validation("detail too long".to_string()));
    }

    let id = state
        .store
        .update(|doc| {
            if doc.find_user(target_user_id).is_none() {
                return Err(ApiError::NotFound);
            }
            let report = Report {
                id: next_id(&doc.reports, |r| r.id),
                reporter_id: user_id,
                target_user_id,
                categories: payload.categories.clone(),
                detail: payload.detail.clone(),
                created_at: Utc::now(),
            };
            let id = report.id;
            doc.reports.push(report);
            Ok(id)
        })
        .await??;

    Ok((StatusCode::CREATED, Json(json!({ "reported": true, "id": id }))))
}

/// List open reports. Admin role or shared secret required.
pub async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let identity = identity_from_headers(&state, &headers).await;
    let secret = header_secret(&headers);
    let doc = state.store.read().await;
    admin_gate(&doc, &state.config, identity, secret.as_deref())?;
    Ok(Json(doc.reports.clone()))
}

/// Act on a report: suspend the reported user, or resolve it.
pub async fn act_on_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<ReportActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = identity_from_headers(&state, &headers).await;
    let secret = payload
        .admin_secret
        .clone()
        .or_else(|| header_secret(&headers));
    let action = payload
        .action
        .ok_or_else(|| ApiError::Validation("action required".to_string()))?;
    let report_id = payload
        .report_id
        .ok_or_else(|| ApiError::Validation("reportId required".to_string()))?;

    let config = state.config.clone();
    let body = state
        .store
        .update(move |doc| {
            admin_gate(doc, &config, identity, secret.as_deref())?;
            let report = doc
                .reports
                .iter()
                .find(|r| r.id == report_id)
                .cloned()
                .ok_or(ApiError::NotFound)?;

            match action.as_str() {
                "suspend" => {
                    let target = doc
                        .find_user_mut(report.target_user_id)
                        .ok_or(ApiError::NotFound)?;
                    target.suspended = true;
                    doc.reports.retain(|r| r.id != report_id);
                    Ok(json!({ "suspended": true }))
                }
                "resolve" => {
                    doc.reports.retain(|r| r.id != report_id);
                    Ok(json!({ "resolved": true }))
                }
                other => Err(ApiError::Validation(format!("unknown action: {other}"))),
            }
        })
        .await??;

    info!("report {} handled", report_id);
    Ok(Json(body))
}

/// Grant the admin role to a user.
pub async fn promote(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<PromoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = identity_from_headers(&state, &headers).await;
    let secret = payload
        .admin_secret
        .clone()
        .or_else(|| header_secret(&headers));
    let target_user_id = payload
        .target_user_id
        .ok_or_else(|| ApiError::Validation("targetUserId required".to_string()))?;

    let config = state.config.clone();
    state
        .store
        .update(move |doc| {
            admin_gate(doc, &config, identity, secret.as_deref())?;
            let target = doc.find_user_mut(target_user_id).ok_or(ApiError::NotFound)?;
            target.admin = true;
            Ok::<_, ApiError>(())
        })
        .await??;

    Ok(Json(json!({ "promoted": true })))
}
