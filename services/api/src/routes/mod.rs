//! HTTP routing
//!
//! The API lives under `/api`; everything else is static asset serving.
//! Routes whose handlers always require a caller sit behind the auth
//! middleware; mixed routes resolve their identity in the handler.

pub mod chat;
pub mod follow;
pub mod live;
pub mod media;
pub mod memorials;
pub mod moderation;
pub mod posts;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ApiError;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// JSON bodies are bounded at 1 MiB, multipart uploads at 10 MiB. Both
/// limits are enforced as bytes arrive, not after buffering.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/reset-password", post(users::reset_password))
        .route("/users/block", post(users::block))
        .route("/users/unblock", post(users::unblock))
        .route("/follow/request", post(follow::request))
        .route("/follow/approve", post(follow::approve))
        .route("/follow/deny", post(follow::deny))
        .route("/report", post(moderation::report))
        .route("/live/start", post(live::start))
        .route("/live/stop", post(live::stop))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let media_routes = Router::new()
        .route("/records/:id/media", get(media::list).post(media::attach))
        .route("/memorials/:id/media", get(media::list).post(media::attach))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let api = Router::new()
        .route("/users", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/:id", get(users::profile))
        .route("/records", get(memorials::list).post(memorials::create))
        .route(
            "/records/:id",
            get(memorials::get_one)
                .put(memorials::update)
                .delete(memorials::remove),
        )
        .route("/memorials", get(memorials::list).post(memorials::create))
        .route(
            "/memorials/:id",
            get(memorials::get_one)
                .put(memorials::update)
                .delete(memorials::remove),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route("/posts/:id", get(posts::get_one))
        .route(
            "/admin/reports",
            get(moderation::list_reports).post(moderation::act_on_report),
        )
        .route("/admin/promote", post(moderation::promote))
        .route("/chat/stream", get(chat::stream))
        .route("/chat/send", post(chat::send))
        .merge(protected)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .merge(media_routes)
        .fallback(api_fallback);

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_fallback() -> ApiError {
    ApiError::NotFound
}
