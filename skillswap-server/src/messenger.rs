//! The single send/read pipeline shared by the request path and the live
//! path, so both converge on one stored representation and one push.

use std::sync::Arc;

use skillswap_core::{aggregate_conversations, Conversation, Message, ServerEvent};
use tracing::{debug, info};

use crate::error::ChatError;
use crate::hub::Broadcast;
use crate::store::MessageStore;

#[derive(Clone)]
pub struct Messenger {
    store: Arc<dyn MessageStore>,
    fanout: Arc<dyn Broadcast>,
}

impl Messenger {
    pub fn new(store: Arc<dyn MessageStore>, fanout: Arc<dyn Broadcast>) -> Self {
        Self { store, fanout }
    }

    /// Persists the message, then pushes `new_message` to the receiver's
    /// group. Nothing is pushed unless the write succeeded.
    pub async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, ChatError> {
        let message = self.store.send(sender_id, receiver_id, content).await?;
        let delivered = self
            .fanout
            .emit_to_user(&message.receiver_id, &ServerEvent::NewMessage(message.clone()));
        info!(
            message_id = %message.id,
            sender_id,
            receiver_id,
            delivered,
            "message sent"
        );
        Ok(message)
    }

    pub async fn conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ChatError> {
        let messages = self.store.list_for_user(user_id).await?;
        Ok(aggregate_conversations(user_id, messages))
    }

    /// History with `partner_id`, oldest first, as it was before opening;
    /// then everything the partner sent is marked read.
    pub async fn open_thread(
        &self,
        user_id: &str,
        partner_id: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let messages = self.store.list_between(user_id, partner_id).await?;
        self.mark_read(user_id, partner_id).await?;
        Ok(messages)
    }

    pub async fn mark_read(&self, user_id: &str, partner_id: &str) -> Result<u64, ChatError> {
        let updated = self.store.mark_read(user_id, partner_id).await?;
        if updated > 0 {
            debug!(user_id, partner_id, updated, "marked messages read");
        }
        Ok(updated)
    }
}
