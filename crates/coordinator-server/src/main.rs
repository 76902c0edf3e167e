//! TCP session coordinator binary.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coordinator_core::UserId;
use coordinator_server::auth::StaticTokenVerifier;
use coordinator_server::config::Config;
use coordinator_server::server;
use coordinator_server::store::{MatchStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let verifier = StaticTokenVerifier::from_spec(&config.auth_tokens)?;
    if verifier.is_empty() {
        warn!("COORD_AUTH_TOKENS is empty; every connection will be refused");
    }

    // Standalone deployments run against the in-process store; a real
    // deployment wires its own `MatchStore` behind the same trait.
    let store = Arc::new(MemoryStore::new());
    if let Some((player_x, player_o)) = config.seed_match {
        let record = store
            .create_match(UserId(player_x), UserId(player_o))
            .await?;
        info!(
            "seeded match {} ({} as X vs {} as O)",
            record.id.0, player_x, player_o
        );
    }

    info!(
        "starting coordinator-server on {}:{} (max_clients = {})",
        config.bind_addr, config.port, config.max_clients
    );

    server::run(config, store, Arc::new(verifier)).await
}
