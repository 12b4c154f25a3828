//! Shared application state handed to every handler.

use std::sync::Arc;

use {warble_auth::ApiKeyStore, warble_browser::SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub keys: Arc<ApiKeyStore>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionRegistry>, keys: Arc<ApiKeyStore>) -> Self {
        Self { sessions, keys }
    }
}
