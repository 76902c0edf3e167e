//! Durable match store seam.
//!
//! The permanent record of matches and their append-only move logs
//! lives outside this process. The coordinator consumes it through
//! [`MatchStore`]: resident rooms are a read-through, write-through
//! cache over this contract, never the other way around. On restart
//! every room is gone and is rebuilt from here.
//!
//! [`MemoryStore`] is an in-process implementation that enforces the
//! same uniqueness constraints a backing database would; it serves the
//! standalone binary and the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use coordinator_core::{MatchId, MatchRecord, MatchStatus, MoveRecord, UserId};

/// Store-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No match with the given id.
    #[error("match not found")]
    NotFound,

    /// An append collided with an existing (match, position) or
    /// (match, sequence) row. The caller's view of the log is stale.
    #[error("conflicting move append")]
    Conflict,

    /// The store could not be reached or answered with a transient
    /// failure; safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read/write contract of the durable match store.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Create a fresh ongoing match; `player_x` is the first mover.
    async fn create_match(
        &self,
        player_x: UserId,
        player_o: UserId,
    ) -> Result<MatchRecord, StoreError>;

    async fn get_match(&self, id: MatchId) -> Result<MatchRecord, StoreError>;

    /// All moves for a match, ascending by sequence.
    async fn list_moves(&self, id: MatchId) -> Result<Vec<MoveRecord>, StoreError>;

    /// Append one move. Fails with [`StoreError::Conflict`] if the
    /// position or the sequence number is already present for this
    /// match; moves are immutable once persisted.
    async fn append_move(
        &self,
        id: MatchId,
        player: UserId,
        position: u8,
        sequence: u32,
    ) -> Result<MoveRecord, StoreError>;

    /// Record a terminal status (and winner, for `Completed`).
    async fn update_match_status(
        &self,
        id: MatchId,
        status: MatchStatus,
        winner: Option<UserId>,
    ) -> Result<MatchRecord, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: u64,
    matches: HashMap<MatchId, MatchRecord>,
    moves: HashMap<MatchId, Vec<MoveRecord>>,
}

/// In-process [`MatchStore`] with the store's uniqueness constraints.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // The critical sections never await and never leave the maps
        // half-updated, so a poisoned lock is still usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn create_match(
        &self,
        player_x: UserId,
        player_o: UserId,
    ) -> Result<MatchRecord, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = MatchId(inner.next_id);
        let record = MatchRecord::new(id, player_x, player_o);
        inner.matches.insert(id, record.clone());
        inner.moves.insert(id, Vec::new());
        Ok(record)
    }

    async fn get_match(&self, id: MatchId) -> Result<MatchRecord, StoreError> {
        self.lock()
            .matches
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_moves(&self, id: MatchId) -> Result<Vec<MoveRecord>, StoreError> {
        let inner = self.lock();
        if !inner.matches.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        let mut moves = inner.moves.get(&id).cloned().unwrap_or_default();
        moves.sort_by_key(|m| m.sequence);
        Ok(moves)
    }

    async fn append_move(
        &self,
        id: MatchId,
        player: UserId,
        position: u8,
        sequence: u32,
    ) -> Result<MoveRecord, StoreError> {
        let mut inner = self.lock();
        if !inner.matches.contains_key(&id) {
            return Err(StoreError::NotFound);
        }

        let log = inner.moves.entry(id).or_default();
        if log
            .iter()
            .any(|m| m.position == position || m.sequence == sequence)
        {
            return Err(StoreError::Conflict);
        }

        let record = MoveRecord {
            match_id: id,
            player,
            position,
            sequence,
        };
        log.push(record.clone());
        Ok(record)
    }

    async fn update_match_status(
        &self,
        id: MatchId,
        status: MatchStatus,
        winner: Option<UserId>,
    ) -> Result<MatchRecord, StoreError> {
        let mut inner = self.lock();
        let record = inner.matches.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.status = status;
        record.winner = winner;
        Ok(record.clone())
    }
}
