use serde::{Deserialize, Serialize};

use super::{Message, UserSummary};

/// Per-partner thread derived from the message log; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub partner: UserSummary,
    pub last_message: Message,
    pub unread_count: u32,
}
