pub mod http;
pub mod ws;

pub use http::{MarkReadResponse, SendMessageRequest};
pub use ws::{ClientEvent, Connected, MessageError, ReceiverRef, SendMessage, ServerEvent, TypingNotice};
