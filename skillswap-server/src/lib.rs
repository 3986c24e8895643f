use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod auth;
pub mod config;
pub mod controllers;
pub mod error;
pub mod hub;
pub mod live;
pub mod messenger;
pub mod routes;
pub mod store;

use auth::TokenKey;
use hub::ConnectionHub;
use messenger::Messenger;
use store::SqliteMessageStore;

pub use error::ChatError;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: Arc<SqliteMessageStore>,
    /// Registry of live connections per user.
    pub hub: Arc<ConnectionHub>,
    pub messenger: Messenger,
    pub tokens: TokenKey,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: TokenKey) -> Self {
        let store = Arc::new(SqliteMessageStore::new(pool.clone()));
        let hub = Arc::new(ConnectionHub::new());
        let messenger = Messenger::new(store.clone(), hub.clone());
        Self {
            pool,
            store,
            hub,
            messenger,
            tokens,
        }
    }
}

/// Turns a file path into a SQLite URL, creating parent directories and the
/// file itself when missing.
pub fn sqlite_url_for_path(p: &Path) -> anyhow::Result<String> {
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dirs for {:?}", parent))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&abs)
        .with_context(|| format!("create/open sqlite file {:?}", abs))?;
    let s = abs.to_string_lossy().replace('\\', "/");
    Ok(format!("sqlite://{}", s))
}

/// Normalises a configured database location (plain path, `sqlite://` URL or
/// `sqlite::memory:`) into a connectable URL.
pub fn build_sqlite_url(raw: &str) -> anyhow::Result<String> {
    if raw == "sqlite::memory:" {
        return Ok(raw.to_string());
    }
    let path_part = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    sqlite_url_for_path(&PathBuf::from(path_part))
}

/// Connects to the database and returns a connection pool.
pub async fn connect_pool(db_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("parse sqlite url {}", db_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // every connection to :memory: is a separate database, so keep exactly one alive
    let pool_options = if db_url == "sqlite::memory:" {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("connect to sqlite via {}", db_url))?;
    Ok(pool)
}

/// Creates the tables and indexes if they do not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let stmts = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id         TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL,
            avatar     TEXT
        );"#,
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            content     TEXT NOT NULL CHECK (length(content) > 0),
            sender_id   TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL,
            FOREIGN KEY(sender_id)   REFERENCES users(id),
            FOREIGN KEY(receiver_id) REFERENCES users(id)
        );"#,
        "CREATE INDEX IF NOT EXISTS idx_messages_unread ON messages(receiver_id, sender_id, read);",
        "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, created_at);",
        "CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id, created_at);",
    ];
    for s in &stmts {
        sqlx::query(s)
            .execute(pool)
            .await
            .with_context(|| format!("apply migration: {}", &s[..s.len().min(40)].replace('\n', " ")))?;
    }
    Ok(())
}

/// Resolves `DATABASE_URL`, connects and brings the schema up to date.
pub async fn open_database(raw: &str) -> anyhow::Result<SqlitePool> {
    let db_url = build_sqlite_url(raw).context("build sqlite DATABASE_URL")?;
    tracing::info!(%db_url, "using database");
    let pool = connect_pool(&db_url).await.context("connect to sqlite")?;
    run_migrations(&pool).await.context("run migrations")?;
    Ok(pool)
}

/// Probes the database by acquiring a pooled connection.
pub async fn health_with_pool(pool: &SqlitePool) -> StatusCode {
    match pool.acquire().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
