//! Room registry: match id → at most one live room task.
//!
//! The registry owns the only cross-room shared state in the process:
//! the `matchId → room` map plus each room's lifecycle membership set.
//! Both live under one mutex that is never held across an await, so
//! join / leave / evict are atomic with respect to each other:
//!
//! - The first join for a match installs the entry and spawns the room
//!   task; hydration happens *inside* the task, so concurrent joins
//!   for the same match collapse onto a single hydration -- the losers
//!   get the same sender and their join requests simply queue behind
//!   it. Different match ids hydrate independently.
//! - The last leave removes the entry, so a later join re-hydrates
//!   from the store instead of resuming stale state. A join that races
//!   the last leave either lands before the membership check (no
//!   eviction) or finds no entry and builds a fresh room.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use coordinator_core::MatchId;

use crate::room;
use crate::store::MatchStore;
use crate::types::{RoomRequest, RoomTx, SessionHandle, SessionId};

struct RoomEntry {
    tx: RoomTx,

    /// Sessions counted as members for lifecycle purposes. The room
    /// task keeps its own delivery map; this set only decides when the
    /// entry is evicted.
    members: HashSet<SessionId>,
}

/// Process-wide map of resident rooms.
pub struct RoomRegistry {
    store: Arc<dyn MatchStore>,
    store_timeout: Duration,
    rooms: Mutex<HashMap<MatchId, RoomEntry>>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn MatchStore>, store_timeout: Duration) -> Arc<Self> {
        Arc::new(RoomRegistry {
            store,
            store_timeout,
            rooms: Mutex::new(HashMap::new()),
        })
    }

    /// Join a session to the room for `match_id`, creating the room
    /// (and starting its hydration) if it is not resident.
    ///
    /// Returns the sender the session uses for its move traffic.
    pub async fn join(self: &Arc<Self>, match_id: MatchId, session: SessionHandle) -> RoomTx {
        let tx = {
            let mut rooms = self.rooms.lock().await;
            let entry = rooms.entry(match_id).or_insert_with(|| {
                info!("match {}: creating room", match_id.0);
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(room::run_room(
                    match_id,
                    rx,
                    Arc::clone(&self.store),
                    Arc::clone(self),
                    self.store_timeout,
                ));
                RoomEntry {
                    tx,
                    members: HashSet::new(),
                }
            });
            entry.members.insert(session.session_id);
            entry.tx.clone()
        };

        // Queue the join behind any in-flight hydration; the room task
        // answers with the authoritative snapshot (or a rejection).
        let _ = tx.send(RoomRequest::Join { session });
        tx
    }

    /// Remove a session from a room's membership; evicts the room when
    /// the membership set becomes empty.
    pub async fn leave(&self, match_id: MatchId, session_id: SessionId) {
        let tx = {
            let mut rooms = self.rooms.lock().await;
            let Some(entry) = rooms.get_mut(&match_id) else {
                return;
            };
            if !entry.members.remove(&session_id) {
                return;
            }
            let tx = entry.tx.clone();
            if entry.members.is_empty() {
                rooms.remove(&match_id);
                info!("match {}: last member left, evicting room", match_id.0);
            }
            tx
        };

        let _ = tx.send(RoomRequest::Leave { session_id });
    }

    /// Drop the entry for a room whose hydration failed, so a later
    /// join retries against the store. Called by the room task itself.
    pub(crate) async fn evict_failed(&self, match_id: MatchId) {
        if self.rooms.lock().await.remove(&match_id).is_some() {
            debug!("match {}: evicted unservable room", match_id.0);
        }
    }

    /// Number of resident rooms (diagnostics and tests).
    pub async fn resident_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Whether a room for `match_id` is currently resident.
    pub async fn is_resident(&self, match_id: MatchId) -> bool {
        self.rooms.lock().await.contains_key(&match_id)
    }
}
