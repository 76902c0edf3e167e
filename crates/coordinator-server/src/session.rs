//! Per-connection session task.
//!
//! Each accepted connection runs one of these:
//! - a writer task drains the session's outbound channel onto the
//!   socket (one JSON event per line),
//! - the reader half performs the auth handshake, then dispatches
//!   inbound events to the room registry / room tasks.
//!
//! The session holds the match ids it joined (plus the room senders),
//! not room references; on disconnect it walks that map and leaves
//! every room, which is what eventually evicts empty rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use coordinator_core::{MatchId, UserId};
use coordinator_protocol::{
    decode_client_line, encode_server_event, ClientEvent, PresenceState, RejectReason, WireEvent,
};

use crate::auth::IdentityVerifier;
use crate::registry::RoomRegistry;
use crate::types::{ClientRegistry, OutboundRx, RoomRequest, RoomTx, SessionHandle, SessionId};

/// Everything a session task needs from the rest of the server.
pub(crate) struct Gateway {
    pub clients: ClientRegistry,
    pub registry: Arc<RoomRegistry>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub auth_timeout: Duration,
}

/// Run the I/O loop for a single connection.
pub(crate) async fn run_session(
    session_id: SessionId,
    stream: TcpStream,
    gateway: Arc<Gateway>,
) -> Result<()> {
    let (read_half, write_half) = stream.into_split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    // Writer task: drains outbound events onto the socket. Ends when
    // every sender clone is gone (session cleanup plus room leaves).
    tokio::spawn(run_writer(session_id, write_half, out_rx));

    let mut lines = BufReader::new(read_half).lines();

    // Handshake: the first event must be `auth` and must verify,
    // within the auth timeout; otherwise the connection is refused
    // before any room interaction.
    let user_id = match timeout(gateway.auth_timeout, next_event(&mut lines)).await {
        Err(_) => {
            debug!("session {}: auth timeout", session_id.0);
            let _ = out_tx.send(WireEvent::AuthFailed {
                reason: "authentication timed out".to_string(),
            });
            return Ok(());
        }
        Ok(Err(e)) => return Err(e),
        Ok(Ok(None)) => return Ok(()),
        Ok(Ok(Some(ClientEvent::Auth { token }))) => {
            match gateway.verifier.verify(&token).await {
                Ok(user_id) => user_id,
                Err(e) => {
                    info!("session {}: refused ({e})", session_id.0);
                    let _ = out_tx.send(WireEvent::AuthFailed {
                        reason: e.to_string(),
                    });
                    return Ok(());
                }
            }
        }
        Ok(Ok(Some(_))) => {
            debug!("session {}: first event was not auth", session_id.0);
            let _ = out_tx.send(WireEvent::AuthFailed {
                reason: "expected auth handshake".to_string(),
            });
            return Ok(());
        }
    };

    let handle = SessionHandle {
        session_id,
        user_id,
        tx: out_tx.clone(),
    };

    // Register presence. The user-status broadcast only fires for the
    // user's first live session.
    let first_session_of_user = {
        let mut clients = gateway.clients.write().await;
        let first = !clients.values().any(|h| h.user_id == user_id);
        clients.insert(session_id, handle.clone());
        first
    };

    info!(
        "session {}: authenticated as user {}",
        session_id.0, user_id.0
    );
    let _ = out_tx.send(WireEvent::Authenticated { user_id: user_id.0 });
    let _ = out_tx.send(WireEvent::OnlineUsers {
        ids: online_user_ids(&gateway.clients).await,
    });
    if first_session_of_user {
        broadcast_presence(&gateway.clients, session_id, user_id, PresenceState::Online).await;
    }

    // Main dispatch loop; cleanup must run on every exit path.
    let mut joined: HashMap<MatchId, RoomTx> = HashMap::new();
    let result = read_loop(&mut lines, &gateway, &handle, &mut joined).await;

    for (match_id, _tx) in joined.drain() {
        gateway.registry.leave(match_id, session_id).await;
    }
    let last_session_of_user = {
        let mut clients = gateway.clients.write().await;
        clients.remove(&session_id);
        !clients.values().any(|h| h.user_id == user_id)
    };
    if last_session_of_user {
        broadcast_presence(&gateway.clients, session_id, user_id, PresenceState::Offline).await;
    }
    info!("session {}: disconnected", session_id.0);

    result
}

async fn read_loop(
    lines: &mut tokio::io::Lines<BufReader<OwnedReadHalf>>,
    gateway: &Arc<Gateway>,
    handle: &SessionHandle,
    joined: &mut HashMap<MatchId, RoomTx>,
) -> Result<()> {
    let session_id = handle.session_id;

    while let Some(event) = next_event(lines).await? {
        match event {
            ClientEvent::Auth { .. } => {
                debug!("session {}: duplicate auth ignored", session_id.0);
            }

            ClientEvent::Join { match_id } => {
                let match_id = MatchId(match_id);
                let tx = gateway.registry.join(match_id, handle.clone()).await;
                joined.insert(match_id, tx);
            }

            ClientEvent::Move { match_id, position } => {
                let match_id = MatchId(match_id);
                let Some(tx) = joined.get(&match_id) else {
                    // Moves are only routed for joined rooms.
                    let _ = handle.tx.send(WireEvent::MoveRejected {
                        match_id: match_id.0,
                        reason: RejectReason::NotFound,
                    });
                    continue;
                };

                let request = RoomRequest::Move {
                    session_id,
                    user_id: handle.user_id,
                    position,
                };
                if tx.send(request).is_err() {
                    // The room task is gone (failed hydration); make
                    // the session re-join to get a fresh room.
                    joined.remove(&match_id);
                    gateway.registry.leave(match_id, session_id).await;
                    let _ = handle.tx.send(WireEvent::MoveRejected {
                        match_id: match_id.0,
                        reason: RejectReason::NotFound,
                    });
                }
            }

            ClientEvent::RequestOnlineUsers => {
                let _ = handle.tx.send(WireEvent::OnlineUsers {
                    ids: online_user_ids(&gateway.clients).await,
                });
            }
        }
    }

    Ok(())
}

/// Read the next decodable event, skipping blank and malformed lines.
/// `Ok(None)` means the peer closed the connection.
async fn next_event(
    lines: &mut tokio::io::Lines<BufReader<OwnedReadHalf>>,
) -> Result<Option<ClientEvent>> {
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode_client_line(line) {
            Ok(event) => return Ok(Some(event)),
            Err(e) => {
                debug!("dropping undecodable line: {e}");
            }
        }
    }
    Ok(None)
}

async fn run_writer(session_id: SessionId, mut write_half: OwnedWriteHalf, mut out_rx: OutboundRx) {
    while let Some(event) = out_rx.recv().await {
        let line = match encode_server_event(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("session {}: {e}", session_id.0);
                continue;
            }
        };
        let framed = format!("{}\n", line);
        if let Err(e) = write_half.write_all(framed.as_bytes()).await {
            debug!("session {}: write error: {e}", session_id.0);
            break;
        }
    }
}

/// Deduplicated ids of all currently-authenticated users.
async fn online_user_ids(clients: &ClientRegistry) -> Vec<u64> {
    let guard = clients.read().await;
    let mut ids: Vec<u64> = guard.values().map(|h| h.user_id.0).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Broadcast a user's presence change to every other session.
async fn broadcast_presence(
    clients: &ClientRegistry,
    origin: SessionId,
    user_id: UserId,
    state: PresenceState,
) {
    // Snapshot of current sessions to minimize lock hold time.
    let targets: Vec<SessionHandle> = {
        let guard = clients.read().await;
        guard.values().cloned().collect()
    };

    for target in targets {
        if target.session_id == origin {
            continue;
        }
        let _ = target.tx.send(WireEvent::UserStatus {
            user_id: user_id.0,
            state,
        });
    }
}
