use serde::{Deserialize, Serialize};

use super::UserSummary;

/// Direct message as persisted by the store and pushed over the live channel.
///
/// Everything except `read` is fixed at creation; `read` only ever moves
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub read: bool,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub created_at: String, // RFC3339 UTC, millisecond precision
}

impl Message {
    /// The participant on the other side of this message as seen by `viewer`.
    pub fn partner_of(&self, viewer: &str) -> &UserSummary {
        if self.sender_id == viewer {
            &self.receiver
        } else {
            &self.sender
        }
    }

    pub fn is_unread_for(&self, viewer: &str) -> bool {
        self.receiver_id == viewer && !self.read
    }
}
