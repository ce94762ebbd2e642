//! Application state shared across handlers

use std::sync::Arc;

use common::DocumentStore;

use crate::chat::ChatHub;
use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub chat: ChatHub,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: DocumentStore, config: AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            chat: ChatHub::new(),
            config: Arc::new(config),
        }
    }
}
