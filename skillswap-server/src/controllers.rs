use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use skillswap_core::{Conversation, MarkReadResponse, Message, SendMessageRequest};

use crate::auth::AuthUser;
use crate::error::ChatError;
use crate::{health_with_pool, AppState};

/// Handler for POST /api/messages
///
/// Body rejections (bad JSON, wrong content type) answer with the same
/// `validation_error` body as any other invalid input.
pub async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ChatError> {
    let Json(req) = body?;
    let message = state
        .messenger
        .send(&user_id, &req.receiver_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Handler for GET /api/messages/conversations
pub async fn list_conversations(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Conversation>>, ChatError> {
    Ok(Json(state.messenger.conversations(&user_id).await?))
}

/// Handler for GET /api/messages/:userId
///
/// Opening a thread also marks what the partner sent as read.
pub async fn list_messages(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(partner_id): Path<String>,
) -> Result<Json<Vec<Message>>, ChatError> {
    Ok(Json(state.messenger.open_thread(&user_id, &partner_id).await?))
}

/// Handler for PATCH /api/messages/:userId/read
pub async fn mark_read(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(partner_id): Path<String>,
) -> Result<Json<MarkReadResponse>, ChatError> {
    let updated = state.messenger.mark_read(&user_id, &partner_id).await?;
    Ok(Json(MarkReadResponse {
        message: "Messages marked as read".to_string(),
        updated,
    }))
}

/// Handler for GET /api/health
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let status = health_with_pool(&state.pool).await;
    let body = if status.is_success() {
        json!({ "status": "ok" })
    } else {
        json!({ "status": "unavailable" })
    };
    (status, Json(body))
}
