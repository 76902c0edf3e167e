//! Per-match room task.
//!
//! Each resident match is owned by exactly one of these tasks. The
//! task hydrates the game state from the durable store, then processes
//! [`RoomRequest`]s strictly one at a time -- the request channel is
//! the mutual-exclusion region, so two concurrent move submissions for
//! the same match can never both see the disputed cell as empty, and
//! the persisted sequence can never race the in-memory apply order.
//!
//! Persistence discipline: a move is committed in memory only after
//! its durable append succeeded, and no broadcast is emitted before
//! its triggering mutation is durably committed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use coordinator_core::{GameState, MatchId, MatchStatus, Outcome, UserId};
use coordinator_protocol::{wire_board, Mark, RejectReason, WireEvent};

use crate::registry::RoomRegistry;
use crate::store::{MatchStore, StoreError};
use crate::types::{OutboundTx, RoomRequest, RoomRx, SessionHandle, SessionId};

/// Why hydration could not produce a servable room.
enum HydrateFailure {
    /// Unknown match id.
    NotFound,
    /// The store did not answer in time; a later join may retry.
    Unavailable,
    /// The persisted log does not replay into a legal board. The
    /// match is refused rather than served corrupted.
    Corrupt,
}

impl HydrateFailure {
    fn reject_reason(&self) -> RejectReason {
        match self {
            HydrateFailure::NotFound | HydrateFailure::Corrupt => RejectReason::NotFound,
            HydrateFailure::Unavailable => RejectReason::StoreUnavailable,
        }
    }
}

/// Run the task owning one match's room.
///
/// Exits when every sender is gone (the registry evicted the entry and
/// all member sessions disconnected), or immediately after answering
/// queued requests if hydration failed.
pub(crate) async fn run_room(
    match_id: MatchId,
    mut rx: RoomRx,
    store: Arc<dyn MatchStore>,
    registry: Arc<RoomRegistry>,
    store_timeout: Duration,
) {
    let state = match hydrate(match_id, store.as_ref(), store_timeout).await {
        Ok(state) => state,
        Err(failure) => {
            // Failure here is fatal for this room only. Drop the
            // registry entry first so a later join re-hydrates, then
            // keep answering until every outstanding sender is gone --
            // a request that raced the eviction still gets a reply.
            registry.evict_failed(match_id).await;
            let reason = failure.reject_reason();
            // Sessions keep the sender they got at join time, so their
            // follow-up moves still land here. Remember who was turned
            // away and reject those moves too; nothing goes silent.
            let mut turned_away: HashMap<SessionId, OutboundTx> = HashMap::new();
            while let Some(req) = rx.recv().await {
                match req {
                    RoomRequest::Join { session } => {
                        let _ = session.tx.send(WireEvent::JoinRejected {
                            match_id: match_id.0,
                            reason,
                        });
                        turned_away.insert(session.session_id, session.tx);
                    }
                    RoomRequest::Leave { session_id } => {
                        turned_away.remove(&session_id);
                    }
                    RoomRequest::Move { session_id, .. } => match turned_away.get(&session_id) {
                        Some(tx) => {
                            let _ = tx.send(WireEvent::MoveRejected {
                                match_id: match_id.0,
                                reason,
                            });
                        }
                        None => debug!(
                            "match {}: dropping move from unknown session {}",
                            match_id.0, session_id.0
                        ),
                    },
                }
            }
            return;
        }
    };

    let mut room = Room {
        match_id,
        state,
        members: HashMap::new(),
        store,
        store_timeout,
    };

    // A terminal outcome the stored status missed (a lost status
    // write) is repaired before any traffic is served.
    if room.state.status_repaired() {
        warn!(
            "match {}: stored status lagged behind move log, repairing",
            match_id.0
        );
        room.persist_status().await;
    }

    info!(
        "match {}: room hydrated at move {} ({:?})",
        match_id.0,
        room.state.next_sequence() - 1,
        room.state.status()
    );

    while let Some(req) = rx.recv().await {
        match req {
            RoomRequest::Join { session } => room.handle_join(session),
            RoomRequest::Leave { session_id } => room.handle_leave(session_id),
            RoomRequest::Move {
                session_id,
                user_id,
                position,
            } => room.handle_move(session_id, user_id, position).await,
        }
    }

    debug!("match {}: room task exiting", match_id.0);
}

/// Fetch the match and replay its move log.
async fn hydrate(
    match_id: MatchId,
    store: &dyn MatchStore,
    store_timeout: Duration,
) -> Result<GameState, HydrateFailure> {
    let record = match timeout(store_timeout, store.get_match(match_id)).await {
        Err(_) => {
            warn!("match {}: store timed out fetching match", match_id.0);
            return Err(HydrateFailure::Unavailable);
        }
        Ok(Err(StoreError::NotFound)) => return Err(HydrateFailure::NotFound),
        Ok(Err(e)) => {
            warn!("match {}: store failed fetching match: {e}", match_id.0);
            return Err(HydrateFailure::Unavailable);
        }
        Ok(Ok(record)) => record,
    };

    let moves = match timeout(store_timeout, store.list_moves(match_id)).await {
        Err(_) => {
            warn!("match {}: store timed out listing moves", match_id.0);
            return Err(HydrateFailure::Unavailable);
        }
        Ok(Err(e)) => {
            warn!("match {}: store failed listing moves: {e}", match_id.0);
            return Err(HydrateFailure::Unavailable);
        }
        Ok(Ok(moves)) => moves,
    };

    GameState::hydrate(record, &moves).map_err(|e| {
        warn!("match {}: move log does not replay: {e}", match_id.0);
        HydrateFailure::Corrupt
    })
}

/// Authoritative in-memory room: one match's state plus the delivery
/// handles of its connected sessions.
struct Room {
    match_id: MatchId,
    state: GameState,
    members: HashMap<SessionId, SessionHandle>,
    store: Arc<dyn MatchStore>,
    store_timeout: Duration,
}

impl Room {
    fn handle_join(&mut self, session: SessionHandle) {
        debug!(
            "match {}: session {} (user {}) joined",
            self.match_id.0, session.session_id.0, session.user_id.0
        );

        // The joiner gets the current authoritative snapshot; a
        // finished match also gets its outcome replayed.
        let _ = session.tx.send(self.snapshot());
        if self.state.status().is_terminal() {
            let _ = session.tx.send(self.game_over_event());
        }

        self.members.insert(session.session_id, session);
        self.broadcast(WireEvent::PeerCount {
            match_id: self.match_id.0,
            count: self.members.len(),
        });
    }

    fn handle_leave(&mut self, session_id: SessionId) {
        if self.members.remove(&session_id).is_none() {
            return;
        }
        debug!(
            "match {}: session {} left",
            self.match_id.0, session_id.0
        );
        self.broadcast(WireEvent::PeerCount {
            match_id: self.match_id.0,
            count: self.members.len(),
        });
    }

    async fn handle_move(&mut self, session_id: SessionId, user_id: UserId, position: u8) {
        let Some(sender) = self.members.get(&session_id) else {
            // A move from a session the room never saw join; the
            // session task guards against this, so just drop it.
            warn!(
                "match {}: move from non-member session {}",
                self.match_id.0, session_id.0
            );
            return;
        };
        let reply = sender.tx.clone();

        let staged = match self.state.propose(user_id, position) {
            Ok(staged) => staged,
            Err(e) => {
                debug!(
                    "match {}: rejecting move by user {}: {e}",
                    self.match_id.0, user_id.0
                );
                let _ = reply.send(WireEvent::MoveRejected {
                    match_id: self.match_id.0,
                    reason: RejectReason::from(&e),
                });
                return;
            }
        };

        // Durable append first; the in-memory board advances only if
        // this succeeds, so there is no partial application.
        let append = timeout(
            self.store_timeout,
            self.store.append_move(
                self.match_id,
                staged.player(),
                staged.position(),
                staged.sequence(),
            ),
        )
        .await;

        let reason = match append {
            Ok(Ok(_)) => None,
            Err(_) => {
                warn!(
                    "match {}: store timed out appending move {}",
                    self.match_id.0,
                    staged.sequence()
                );
                Some(RejectReason::StoreUnavailable)
            }
            Ok(Err(StoreError::Unavailable(e))) => {
                warn!(
                    "match {}: store unavailable appending move {}: {e}",
                    self.match_id.0,
                    staged.sequence()
                );
                Some(RejectReason::StoreUnavailable)
            }
            Ok(Err(StoreError::Conflict)) => {
                // The durable log knows a move this room does not: a
                // stale writer raced us through the store. Surface it
                // like an occupied cell; the client re-syncs on join.
                warn!(
                    "match {}: durable conflict appending move {}",
                    self.match_id.0,
                    staged.sequence()
                );
                Some(RejectReason::PositionTaken)
            }
            Ok(Err(StoreError::NotFound)) => Some(RejectReason::NotFound),
        };

        if let Some(reason) = reason {
            let _ = reply.send(WireEvent::MoveRejected {
                match_id: self.match_id.0,
                reason,
            });
            return;
        }

        let applied = self.state.commit(staged);
        info!(
            "match {}: move {} user {} ({}) -> position {} ({:?})",
            self.match_id.0,
            applied.sequence,
            user_id.0,
            applied.symbol.as_char(),
            applied.position,
            applied.outcome
        );

        match applied.outcome {
            Outcome::Winner(_) | Outcome::Tie => {
                self.persist_status().await;
                let event = self.game_over_event();
                self.broadcast(event);
            }
            Outcome::InProgress => {
                let event = self.snapshot();
                self.broadcast(event);
            }
        }
    }

    /// Persist the current (terminal) status and winner.
    ///
    /// A failure here is logged but not fatal: the move log already
    /// encodes the outcome, and hydration repairs the status on the
    /// next residency.
    async fn persist_status(&self) {
        let status = self.state.status();
        let winner = self.state.record().winner;
        let result = timeout(
            self.store_timeout,
            self.store.update_match_status(self.match_id, status, winner),
        )
        .await;
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(
                "match {}: failed to persist status {:?}: {e}",
                self.match_id.0, status
            ),
            Err(_) => warn!(
                "match {}: store timed out persisting status {:?}",
                self.match_id.0, status
            ),
        }
    }

    fn snapshot(&self) -> WireEvent {
        WireEvent::RoomState {
            match_id: self.match_id.0,
            board: wire_board(self.state.board()),
            turn: Mark::from(self.state.turn()),
        }
    }

    fn game_over_event(&self) -> WireEvent {
        let winner: Option<Mark> = match self.state.status() {
            MatchStatus::Completed => self
                .state
                .record()
                .winner
                .and_then(|user| self.state.symbol_of(user))
                .map(Mark::from),
            _ => None,
        };
        WireEvent::GameOver {
            match_id: self.match_id.0,
            winner,
            board: wire_board(self.state.board()),
        }
    }

    fn broadcast(&self, event: WireEvent) {
        for member in self.members.values() {
            let _ = member.tx.send(event.clone());
        }
    }
}
