/* Frames travelling over the live channel.
    Every frame is a JSON text frame shaped as { "type": <event>, "payload": <object> }.
    ClientEvent -> what an authenticated connection may ask for
    ServerEvent -> what the server pushes, either to a user's group or to one connection
*/
use serde::{Deserialize, Serialize};

use crate::{error::Error, models::Message};

/// Client → Server events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    #[serde(rename = "send_message")]
    SendMessage(SendMessage),
    #[serde(rename = "typing")]
    Typing(ReceiverRef),
    #[serde(rename = "stop_typing")]
    StopTyping(ReceiverRef),
}

/// Server → Client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    /// Sent once to a connection right after it joined its user's group.
    #[serde(rename = "connected")]
    Connected(Connected),
    /// Pushed to every connection of the receiver.
    #[serde(rename = "new_message")]
    NewMessage(Message),
    /// Acknowledgement to the connection that sent the message.
    #[serde(rename = "message_sent")]
    MessageSent(Message),
    #[serde(rename = "message_error")]
    MessageError(MessageError),
    #[serde(rename = "user_typing")]
    UserTyping(TypingNotice),
    #[serde(rename = "user_stop_typing")]
    UserStopTyping(TypingNotice),
    /// Protocol level failure (undecodable frame); never broadcast.
    #[serde(rename = "error")]
    Error(Error),
}

/// Payload of `send_message`. Missing fields decode as empty strings so that
/// they are rejected by message validation instead of the frame decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub content: String,
}

/// Payload of `typing` / `stop_typing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverRef {
    pub receiver_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageError {
    pub error: String,
}
