//! Bearer token authentication middleware and identity helpers

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use crate::crypto;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub u64);

/// Requires a valid bearer token and stores the caller's id in the
/// request extensions for the handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = identity_from_headers(&state, req.headers())
        .await
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

/// Resolves an optional identity from the `Authorization` header.
/// Routes with optional authentication call this directly instead of
/// going through the middleware.
pub async fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Option<u64> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    identity_from_token(state, token).await
}

/// Verifies a token and confirms the embedded user still exists.
pub async fn identity_from_token(state: &AppState, token: &str) -> Option<u64> {
    let claims = crypto::verify_token(&state.config.token_secret, token)?;
    let doc = state.store.read().await;
    doc.find_user(claims.user_id).map(|u| u.id)
}
