//! Central application state
//!
//! Built once in `main` (or by a test harness) and shared with every worker
//! through `web::Data`. Holds the store handle and token keys; nothing here
//! is global.

use crypto_core::JwtKeys;
use std::sync::Arc;

use crate::db::BlogStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub keys: JwtKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }
}
