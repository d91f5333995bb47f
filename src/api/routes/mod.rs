//! API routes module

pub mod chat;
pub mod telegram;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // JSON chat routes
        .nest("/chat", chat::router())
        // Telegram webhook
        .nest("/telegram", telegram::router())
}
