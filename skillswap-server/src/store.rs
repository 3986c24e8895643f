//! Message Store: durable log of direct messages and owner of their read state.

use async_trait::async_trait;
use skillswap_core::{format_timestamp_ms, new_message_id, now_ms, Message, UserSummary};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::error::ChatError;

/// Persistence seam used by both the request path and the live path.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Validates and durably writes a new unread message, returning it with
    /// sender/receiver summaries attached.
    async fn send(&self, sender_id: &str, receiver_id: &str, content: &str)
        -> Result<Message, ChatError>;

    /// Full bidirectional history between two users, oldest first.
    async fn list_between(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>, ChatError>;

    /// Every message sent or received by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Message>, ChatError>;

    /// Marks everything `partner_id` sent to `user_id` as read. Returns the
    /// number of messages that changed; repeating the call returns 0.
    async fn mark_read(&self, user_id: &str, partner_id: &str) -> Result<u64, ChatError>;
}

/// Input rules shared by every send path.
pub fn validate_send(sender_id: &str, receiver_id: &str, content: &str) -> Result<(), ChatError> {
    if content.is_empty() {
        return Err(ChatError::validation("content must not be empty"));
    }
    if receiver_id.trim().is_empty() {
        return Err(ChatError::validation("receiverId is required"));
    }
    if receiver_id == sender_id {
        return Err(ChatError::validation("cannot send a message to yourself"));
    }
    Ok(())
}

const SELECT_MESSAGE: &str = r#"
    SELECT m.id, m.content, m.read, m.sender_id, m.receiver_id, m.created_at,
           s.first_name AS s_first_name, s.last_name AS s_last_name, s.avatar AS s_avatar,
           r.first_name AS r_first_name, r.last_name AS r_last_name, r.avatar AS r_avatar
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.receiver_id
"#;

fn message_from_row(row: &SqliteRow) -> Result<Message, sqlx::Error> {
    let sender_id: String = row.try_get("sender_id")?;
    let receiver_id: String = row.try_get("receiver_id")?;
    let created_at: i64 = row.try_get("created_at")?;
    Ok(Message {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        read: row.try_get("read")?,
        sender: UserSummary {
            id: sender_id.clone(),
            first_name: row.try_get("s_first_name")?,
            last_name: row.try_get("s_last_name")?,
            avatar: row.try_get("s_avatar")?,
        },
        receiver: UserSummary {
            id: receiver_id.clone(),
            first_name: row.try_get("r_first_name")?,
            last_name: row.try_get("r_last_name")?,
            avatar: row.try_get("r_avatar")?,
        },
        sender_id,
        receiver_id,
        created_at: format_timestamp_ms(created_at),
    })
}

/// SQLite-backed [`MessageStore`].
#[derive(Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes the display fields of a user. Called by the user directory
    /// that owns profiles; this core only reads them.
    pub async fn upsert_user(&self, user: &UserSummary) -> Result<(), ChatError> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, avatar) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET first_name = excluded.first_name,
                 last_name = excluded.last_name, avatar = excluded.avatar",
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_messages(&self) -> Result<i64, ChatError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, ChatError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    async fn fetch(&self, message_id: &str) -> Result<Message, ChatError> {
        let sql = format!("{} WHERE m.id = ?", SELECT_MESSAGE);
        let row = sqlx::query(&sql)
            .bind(message_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(message_from_row(&row)?)
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, ChatError> {
        validate_send(sender_id, receiver_id, content)?;
        if !self.user_exists(sender_id).await? {
            return Err(ChatError::validation(format!("unknown sender {}", sender_id)));
        }
        if !self.user_exists(receiver_id).await? {
            return Err(ChatError::validation(format!("unknown receiver {}", receiver_id)));
        }

        let id = new_message_id();
        sqlx::query(
            "INSERT INTO messages (id, content, sender_id, receiver_id, read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(content)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        debug!(message_id = %id, sender_id, receiver_id, "message stored");

        self.fetch(&id).await
    }

    async fn list_between(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>, ChatError> {
        let sql = format!(
            "{} WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                   OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                ORDER BY m.created_at ASC, m.seq ASC",
            SELECT_MESSAGE
        );
        let rows = sqlx::query(&sql)
            .bind(user_a)
            .bind(user_b)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(message_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Message>, ChatError> {
        let sql = format!(
            "{} WHERE m.sender_id = ?1 OR m.receiver_id = ?1
                ORDER BY m.created_at DESC, m.seq DESC",
            SELECT_MESSAGE
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(message_from_row).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn mark_read(&self, user_id: &str, partner_id: &str) -> Result<u64, ChatError> {
        // only ever flips 0 -> 1
        let done = sqlx::query(
            "UPDATE messages SET read = 1 WHERE receiver_id = ? AND sender_id = ? AND read = 0",
        )
        .bind(user_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }
}
