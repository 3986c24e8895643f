//! Live channel: authenticated WebSocket handshake (Connection Gateway) and
//! the per-connection event loop (Live Event Router).
//!
//! A connection is `Connecting` until its credential verifies, `Authenticated`
//! while it holds a [`Membership`], and `Closed` once that guard is dropped.
//! A failed handshake is answered with HTTP 401 and never upgraded.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsFrame, WebSocket},
        Extension, Query, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use skillswap_core::{
    ClientEvent, Connected, Error as WireError, MessageError, ServerEvent, TypingNotice,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::auth::bearer_token;
use crate::error::ChatError;
use crate::hub::{Broadcast, Membership};
use crate::messenger::Messenger;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

/// Handler for GET /ws
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.as_deref().or_else(|| bearer_token(&headers));
    let user_id = match state.tokens.authenticate(token) {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(error = %e, "live handshake refused");
            return ChatError::Authentication(e).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: String) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let membership = state.hub.join(&user_id, tx);
    let connection_id = membership.connection_id();
    info!(%user_id, %connection_id, "live connection authenticated");

    membership.reply(ServerEvent::Connected(Connected { user_id: user_id.clone() }));

    let (mut sender, mut receiver) = socket.split();

    // outbox -> websocket
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "failed to encode server event");
                    continue;
                }
            };
            if sender.send(WsFrame::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // inbound frames are handled one at a time, in arrival order
    let router = LiveRouter::new(state.messenger.clone(), state.hub.clone());
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(WsFrame::Text(text)) => router.handle_frame(&membership, &text).await,
            Ok(WsFrame::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%connection_id, error = %e, "live transport error");
                break;
            }
        }
    }

    // leaving the group drops the last outbox sender, which ends the writer
    drop(membership);
    let _ = forward_task.await;
    info!(%user_id, %connection_id, "live connection closed");
}

/// Interprets client events of one authenticated connection.
#[derive(Clone)]
pub struct LiveRouter {
    messenger: Messenger,
    fanout: Arc<dyn Broadcast>,
}

impl LiveRouter {
    pub fn new(messenger: Messenger, fanout: Arc<dyn Broadcast>) -> Self {
        Self { messenger, fanout }
    }

    /// Decodes a text frame; undecodable frames get an `error` event on this
    /// connection only.
    pub async fn handle_frame(&self, conn: &Membership, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(conn, event).await,
            Err(e) => {
                debug!(connection_id = %conn.connection_id(), error = %e, "undecodable frame");
                conn.reply(ServerEvent::Error(WireError::new(
                    "bad_frame",
                    format!("unrecognised event: {}", e),
                )));
            }
        }
    }

    pub async fn dispatch(&self, conn: &Membership, event: ClientEvent) {
        let sender_id = conn.user_id();
        match event {
            ClientEvent::SendMessage(req) => {
                match self
                    .messenger
                    .send(sender_id, &req.receiver_id, &req.content)
                    .await
                {
                    Ok(message) => {
                        conn.reply(ServerEvent::MessageSent(message));
                    }
                    Err(e) => {
                        match &e {
                            ChatError::Validation(_) => {
                                debug!(sender_id, error = %e, "live send rejected")
                            }
                            _ => error!(sender_id, error = %e, "live send failed"),
                        }
                        let error = match e {
                            ChatError::Validation(msg) => msg,
                            _ => "Failed to send message".to_string(),
                        };
                        conn.reply(ServerEvent::MessageError(MessageError { error }));
                    }
                }
            }
            ClientEvent::Typing(to) => {
                self.fanout.emit_to_user(
                    &to.receiver_id,
                    &ServerEvent::UserTyping(TypingNotice { user_id: sender_id.to_string() }),
                );
            }
            ClientEvent::StopTyping(to) => {
                self.fanout.emit_to_user(
                    &to.receiver_id,
                    &ServerEvent::UserStopTyping(TypingNotice { user_id: sender_id.to_string() }),
                );
            }
        }
    }
}
