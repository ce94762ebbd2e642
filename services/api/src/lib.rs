//! Memorial-book API service
//!
//! A small social/memorial backend: users, posts, follow/block
//! relationships, reports and moderation, chat over server-sent events,
//! live stream key issuance, and media attached to memorial records.
//! All durable state lives in the shared document store from the
//! `common` crate.

pub mod chat;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;
pub mod visibility;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
