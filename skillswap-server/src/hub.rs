//! Connection Gateway registry: which live connections currently belong to
//! each user's broadcast group (`user:<userId>`).

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use skillswap_core::ServerEvent;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Outbound queue of one live connection; drained by its socket writer task.
pub type Outbox = UnboundedSender<ServerEvent>;

/// Fan-out seam used by the messaging paths. The in-process [`ConnectionHub`]
/// implements it; a cross-process backplane could replace it.
pub trait Broadcast: Send + Sync {
    /// Pushes `event` to every live connection of `user_id` and returns how
    /// many connections accepted it.
    fn emit_to_user(&self, user_id: &str, event: &ServerEvent) -> usize;
}

pub fn group_name(user_id: &str) -> String {
    format!("user:{}", user_id)
}

/// Registry of broadcast groups. Only [`ConnectionHub::join`] and the drop of
/// the returned [`Membership`] mutate it; fan-out only reads.
#[derive(Default)]
pub struct ConnectionHub {
    groups: DashMap<String, HashMap<ConnectionId, Outbox>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrols an authenticated connection in `user:<user_id>`. Membership
    /// lasts exactly as long as the returned guard.
    pub fn join(self: &Arc<Self>, user_id: &str, outbox: Outbox) -> Membership {
        let connection_id = Uuid::new_v4();
        self.groups
            .entry(group_name(user_id))
            .or_default()
            .insert(connection_id, outbox.clone());
        debug!(user_id, %connection_id, "joined group");
        Membership {
            hub: Arc::clone(self),
            user_id: user_id.to_string(),
            connection_id,
            outbox,
        }
    }

    fn leave(&self, user_id: &str, connection_id: ConnectionId) {
        let group = group_name(user_id);
        if let Some(mut members) = self.groups.get_mut(&group) {
            members.remove(&connection_id);
        }
        self.groups.remove_if(&group, |_, members| members.is_empty());
        debug!(user_id, %connection_id, "left group");
    }

    /// Live connections currently enrolled for `user_id`.
    pub fn connection_count(&self, user_id: &str) -> usize {
        self.groups
            .get(&group_name(user_id))
            .map(|members| members.len())
            .unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Broadcast for ConnectionHub {
    fn emit_to_user(&self, user_id: &str, event: &ServerEvent) -> usize {
        let Some(members) = self.groups.get(&group_name(user_id)) else {
            return 0;
        };
        members
            .values()
            .filter(|outbox| outbox.send(event.clone()).is_ok())
            .count()
    }
}

/// An authenticated live connection's place in its user's group. Dropping it
/// (normal close, transport error or a panicking task) releases the slot.
pub struct Membership {
    hub: Arc<ConnectionHub>,
    user_id: String,
    connection_id: ConnectionId,
    outbox: Outbox,
}

impl Membership {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Sends to this connection only, not to the rest of the user's group.
    pub fn reply(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.hub.leave(&self.user_id, self.connection_id);
    }
}
