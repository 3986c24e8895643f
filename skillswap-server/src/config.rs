use std::net::SocketAddr;

use clap::{Parser, Subcommand};

/// Command line / environment configuration.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "skillswap real-time messaging server", long_about = None)]
pub struct Config {
    /// Address the HTTP + WebSocket listener binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SQLite file path, `sqlite://` URL or `sqlite::memory:`.
    #[arg(long, env = "DATABASE_URL", default_value = "skillswap.db")]
    pub database_url: String,

    /// Secret shared with the token issuer.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub token_secret: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the server (default).
    Serve,
    /// Print a bearer token for a user, for local testing.
    MintToken {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 7 * 24 * 3600)]
        ttl_secs: u64,
    },
    /// Register or update a user's display profile so they can send and
    /// receive messages.
    SeedUser {
        #[arg(long)]
        id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        avatar: Option<String>,
    },
}

impl Config {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
