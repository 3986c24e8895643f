use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use skillswap_core::Error as WireError;

use crate::auth::AuthError;

/// Failures surfaced by the messaging core to either the request path or
/// the live path.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Malformed or missing input. Never fatal to a live connection.
    #[error("{0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The persistence layer is unavailable or a write failed.
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ChatError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ChatError::Store(_) | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "validation_error",
            ChatError::Authentication(_) => "unauthorized",
            ChatError::Store(_) | ChatError::Internal(_) => "internal_error",
        }
    }

    /// Text safe to show to the caller. Store details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ChatError::Validation(msg) => msg.clone(),
            ChatError::Authentication(e) => e.to_string(),
            ChatError::Store(_) | ChatError::Internal(_) => "Failed to process request".to_string(),
        }
    }

    pub fn to_wire(&self) -> WireError {
        WireError::new(self.code(), self.public_message())
    }
}

impl From<JsonRejection> for ChatError {
    fn from(rejection: JsonRejection) -> Self {
        ChatError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match &self {
            ChatError::Store(e) => tracing::error!(error = %e, "store failure"),
            ChatError::Internal(e) => tracing::error!(error = %e, "internal error"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
        (self.status(), Json(self.to_wire())).into_response()
    }
}
