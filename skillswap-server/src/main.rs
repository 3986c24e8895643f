use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skillswap_core::UserSummary;
use skillswap_server::auth::TokenKey;
use skillswap_server::config::{Command, Config};
use skillswap_server::store::SqliteMessageStore;
use skillswap_server::{open_database, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let tokens = TokenKey::new(&config.token_secret);

    match config.command() {
        Command::MintToken { user, ttl_secs } => {
            println!("{}", tokens.issue(&user, Duration::from_secs(ttl_secs))?);
            Ok(())
        }
        Command::SeedUser { id, first_name, last_name, avatar } => {
            let pool = open_database(&config.database_url).await?;
            let user = UserSummary { id, first_name, last_name, avatar };
            SqliteMessageStore::new(pool).upsert_user(&user).await?;
            info!(user_id = %user.id, "user profile seeded");
            Ok(())
        }
        Command::Serve => serve(&config, tokens).await,
    }
}

async fn serve(config: &Config, tokens: TokenKey) -> anyhow::Result<()> {
    let pool = open_database(&config.database_url).await?;

    let state = Arc::new(AppState::new(pool, tokens));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .context("bind tcp listener")?;
    info!(addr = %config.bind, "listening (REST on /api, live channel on /ws)");

    axum::serve(listener, app.into_make_service())
        .await
        .context("server shutdown")?;

    Ok(())
}
