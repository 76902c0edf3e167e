//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections.
//! - Assigns each connection a `SessionId`.
//! - Spawns a per-session task that authenticates and then dispatches
//!   events to the room registry / room tasks.
//!
//! Rooms are spawned lazily by the registry on first join; there is no
//! central game task, so unrelated matches proceed fully in parallel.
//!
//! The per-session logic and the per-room loop live in the `session`
//! and `room` modules respectively.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::IdentityVerifier;
use crate::config::Config;
use crate::registry::RoomRegistry;
use crate::session::{self, Gateway};
use crate::store::MatchStore;
use crate::types::{ClientRegistry, SessionId};

/// Global-ish counter for assigning unique `SessionId`s.
///
/// In a more elaborate setup you might encapsulate this in a struct,
/// but this is sufficient and threadsafe for our server.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    SessionId(id)
}

/// Bind and run the coordinator with the given configuration.
pub async fn run(
    config: Config,
    store: Arc<dyn MatchStore>,
    verifier: Arc<dyn IdentityVerifier>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);
    run_with_listener(listener, config, store, verifier).await
}

/// Run the accept loop on an already-bound listener.
///
/// Split out so tests can bind port 0 and discover the real address.
pub async fn run_with_listener(
    listener: TcpListener,
    config: Config,
    store: Arc<dyn MatchStore>,
    verifier: Arc<dyn IdentityVerifier>,
) -> anyhow::Result<()> {
    let clients: ClientRegistry = Arc::new(RwLock::new(HashMap::new()));
    let registry = RoomRegistry::new(store, config.store_timeout);
    let gateway = Arc::new(Gateway {
        clients,
        registry,
        verifier,
        auth_timeout: config.auth_timeout,
    });

    // Connections count against the cap from accept, not from auth, so
    // a burst of idle pre-auth sockets cannot exceed it.
    let active_sessions = Arc::new(AtomicUsize::new(0));

    loop {
        let (stream, peer_addr) = listener.accept().await?;

        if active_sessions.load(Ordering::Acquire) >= config.max_clients {
            warn!(
                "rejecting connection from {}: max_clients ({}) reached",
                peer_addr, config.max_clients
            );
            // Just drop the stream; the client sees the connection close.
            continue;
        }
        active_sessions.fetch_add(1, Ordering::AcqRel);

        let session_id = next_session_id();
        info!("accepted connection {} from {}", session_id.0, peer_addr);

        let gateway = Arc::clone(&gateway);
        let active_sessions = Arc::clone(&active_sessions);
        tokio::spawn(async move {
            if let Err(e) = session::run_session(session_id, stream, gateway).await {
                warn!("session {} error: {e:?}", session_id.0);
            }
            active_sessions.fetch_sub(1, Ordering::AcqRel);
        });
    }
}
