//! Grouping of a flat message log into per-partner threads.

use std::collections::HashMap;

use crate::models::{Conversation, Message};

/// Builds one [`Conversation`] per distinct partner of `viewer`.
///
/// `messages` must be ordered newest first (the store's `list_for_user`
/// order). The first message seen for a partner becomes its `last_message`,
/// so the returned threads are ordered by `last_message.created_at`
/// descending, and ties keep the input order.
pub fn aggregate_conversations(viewer: &str, messages: Vec<Message>) -> Vec<Conversation> {
    let mut threads: Vec<Conversation> = Vec::new();
    // partner id -> position in `threads`
    let mut index: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let unread = message.is_unread_for(viewer);
        let partner = message.partner_of(viewer).clone();

        let slot = match index.get(&partner.id) {
            Some(&slot) => slot,
            None => {
                index.insert(partner.id.clone(), threads.len());
                threads.push(Conversation {
                    partner,
                    last_message: message,
                    unread_count: 0,
                });
                threads.len() - 1
            }
        };

        if unread {
            threads[slot].unread_count += 1;
        }
    }

    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserSummary;
    use crate::utils::format_timestamp_ms;

    fn user(id: &str) -> UserSummary {
        UserSummary {
            id: id.to_string(),
            first_name: id.to_uppercase(),
            last_name: "Test".to_string(),
            avatar: None,
        }
    }

    fn msg(id: &str, from: &str, to: &str, at: i64, read: bool) -> Message {
        Message {
            id: id.to_string(),
            content: format!("message {}", id),
            read,
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            sender: user(from),
            receiver: user(to),
            created_at: format_timestamp_ms(at),
        }
    }

    #[test]
    fn groups_by_partner_and_counts_only_received_unread() {
        // newest first, as the store returns them
        let log = vec![
            msg("m6", "c", "b", 600, false),
            msg("m5", "b", "a", 500, false),
            msg("m4", "a", "b", 400, false),
            msg("m3", "a", "b", 300, false),
            msg("m2", "a", "b", 200, true),
            msg("m1", "a", "b", 100, false),
        ];

        let threads = aggregate_conversations("b", log);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].partner.id, "c");
        assert_eq!(threads[0].last_message.id, "m6");
        assert_eq!(threads[0].unread_count, 1);

        assert_eq!(threads[1].partner.id, "a");
        // b's own outgoing message is the latest one in the thread but never unread for b
        assert_eq!(threads[1].last_message.id, "m5");
        assert_eq!(threads[1].unread_count, 3);
    }

    #[test]
    fn partner_summary_comes_from_the_other_side() {
        let threads = aggregate_conversations("a", vec![msg("m1", "a", "b", 100, false)]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].partner.id, "b");
        assert_eq!(threads[0].unread_count, 0);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let log = vec![
            msg("x", "b", "a", 100, false),
            msg("y", "c", "a", 100, false),
            msg("z", "d", "a", 100, false),
        ];
        let first = aggregate_conversations("a", log.clone());
        let second = aggregate_conversations("a", log);

        let ids: Vec<_> = first.iter().map(|c| c.partner.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d"]);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_log_yields_no_threads() {
        assert!(aggregate_conversations("a", Vec::new()).is_empty());
    }
}
