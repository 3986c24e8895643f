//! skillswap-core: wire types shared by the messaging server and its clients
//! (models, HTTP DTOs, live-channel events, errors) plus the conversation
//! aggregation over a message log. No I/O lives here.

pub mod conversations;
pub mod error;
pub mod models;
pub mod protocol;
pub mod utils;

pub use conversations::aggregate_conversations;
pub use error::Error;
pub use models::{conversation::Conversation, message::Message, user::UserSummary};
pub use protocol::http::{MarkReadResponse, SendMessageRequest};
pub use protocol::ws::{
    ClientEvent, Connected, MessageError, ReceiverRef, SendMessage, ServerEvent, TypingNotice,
};
pub use utils::{format_timestamp_ms, new_message_id, now_ms};
