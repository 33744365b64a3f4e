//! Taskboard server: the task-board JSON API over an in-memory document
//! store.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080
//! cargo run --bin taskboard-server
//!
//! # Run on custom address with a config file seeding users
//! cargo run --bin taskboard-server -- --bind 127.0.0.1:3000 --config taskboard.toml
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::config::{ServerCliArgs, ServerConfig};
use taskboard_server::identity::StaticIdentity;
use taskboard_server::notify::{ChannelNotifier, LogMailer};
use taskboard_server::routes;
use taskboard_server::state::BoardState;
use taskboard_server::store::memory::MemoryStore;
use taskboard_server::store::timed::TimedStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let identity = StaticIdentity::new();
    for seed in &config.users {
        identity.insert(seed.token.clone(), seed.user());
    }
    if identity.is_empty() {
        tracing::warn!("no users configured, every API request will be rejected");
    }

    let (notifier, _worker) = ChannelNotifier::spawn(LogMailer, config.notification_buffer);
    let store = TimedStore::new(MemoryStore::new(), config.store_timeout, config.read_retries);
    let state = BoardState::new(
        store,
        Arc::new(identity),
        Arc::new(notifier),
        config.invite_code_length,
    );

    tracing::info!(
        addr = %config.bind_addr,
        users = config.users.len(),
        store_timeout = ?config.store_timeout,
        "starting taskboard server"
    );

    match routes::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskboard server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "taskboard server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start taskboard server");
            std::process::exit(1);
        }
    }
}
