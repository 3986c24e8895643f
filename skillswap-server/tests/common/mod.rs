#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use skillswap_core::UserSummary;
use skillswap_server::auth::TokenKey;
use skillswap_server::{connect_pool, run_migrations, sqlite_url_for_path, AppState};
use tempfile::TempDir;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    // keeps the database directory alive for the duration of the test
    pub dir: TempDir,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn token(&self, user_id: &str) -> String {
        self.state.tokens
            .issue(user_id, Duration::from_secs(300))
            .expect("token")
    }
}

pub fn user(id: &str) -> UserSummary {
    UserSummary {
        id: id.to_string(),
        first_name: id.to_uppercase(),
        last_name: "Tester".to_string(),
        avatar: None,
    }
}

/// Fresh database with alice, bob and carol registered.
pub async fn setup() -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    let url = sqlite_url_for_path(&dir.path().join("skillswap.db")).expect("sqlite url");
    let pool = connect_pool(&url).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let state = Arc::new(AppState::new(pool, TokenKey::new(SECRET)));
    for id in ["alice", "bob", "carol"] {
        state.store.upsert_user(&user(id)).await.expect("seed user");
    }
    TestApp { dir, state }
}
