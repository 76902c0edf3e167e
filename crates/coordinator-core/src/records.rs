//! Durable record types shared with the match store.
//!
//! These are **transport-agnostic** logical records:
//! - [`MatchRecord`]: one game between two identified players.
//! - [`MoveRecord`]: one persisted placement with a server-assigned
//!   sequence number.
//!
//! The store owns the permanent copies; a resident room holds a
//! read-through, write-through cache over them. Wire encodings live in
//! the `coordinator-protocol` crate; this module is purely logical.

/// Identifier for a match.
///
/// This is intentionally opaque; we just require it to be stable for
/// the lifetime of the durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(pub u64);

/// Identifier for a verified user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Lifecycle status of a match.
///
/// Transitions are one-way: `Ongoing -> Completed` or
/// `Ongoing -> Tied`, never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Accepting moves.
    Ongoing,
    /// A winner was found; `winner` is set on the record.
    Completed,
    /// All nine cells filled with no winning line.
    Tied,
}

impl MatchStatus {
    /// True for `Completed` and `Tied`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Ongoing)
    }
}

/// Durable record of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: MatchId,

    /// First mover; always plays X.
    pub player_x: UserId,

    /// Second mover; always plays O.
    pub player_o: UserId,

    pub status: MatchStatus,

    /// Set iff `status == Completed`.
    pub winner: Option<UserId>,
}

impl MatchRecord {
    /// A fresh, ongoing match between two players.
    pub fn new(id: MatchId, player_x: UserId, player_o: UserId) -> Self {
        MatchRecord {
            id,
            player_x,
            player_o,
            status: MatchStatus::Ongoing,
            winner: None,
        }
    }
}

/// Durable record of one placement.
///
/// `sequence` is 1-based, strictly increasing per match with no gaps,
/// and assigned by the room at apply time -- never by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub match_id: MatchId,
    pub player: UserId,

    /// Board position, 0..=8 (row-major).
    pub position: u8,

    pub sequence: u32,
}
