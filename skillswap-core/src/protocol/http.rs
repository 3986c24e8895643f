use serde::{Deserialize, Serialize};

/*
    DTOs of the synchronous request path. Messages and conversations are
    returned as bare models / arrays, so only the inputs and the mark-read
    acknowledgement need their own types.
*/

// POST /api/messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub receiver_id: String,
}

// PATCH /api/messages/:userId/read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub message: String,
    /// Rows flipped from unread to read by this call.
    pub updated: u64,
}
