use uuid::Uuid;

/// Server-assigned message id (UUIDv4).
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}
