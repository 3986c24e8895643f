use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::controllers;
use crate::live;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(controllers::health))
        .route("/api/messages", post(controllers::send_message))
        .route("/api/messages/conversations", get(controllers::list_conversations))
        .route("/api/messages/:user_id", get(controllers::list_messages))
        .route("/api/messages/:user_id/read", patch(controllers::mark_read))
        .route("/ws", get(live::ws_handler))
        .layer(Extension(state))
}
