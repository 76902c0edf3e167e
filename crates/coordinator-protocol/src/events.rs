//! Wire-level event shapes.
//!
//! This module defines:
//! - [`ClientEvent`]: what clients send to the gateway.
//! - [`WireEvent`] (server → client): state, presence, and rejection
//!   events.
//! - Wire mirrors of core types ([`Mark`], [`WireBoard`],
//!   [`RejectReason`]) so the core crate stays serde-free.
//!
//! Everything is a `type`-tagged JSON object with camelCase fields,
//! e.g. `{"type":"move","matchId":3,"position":4}`. The actual line
//! framing lives in `json_codec`.

use serde::{Deserialize, Serialize};

use coordinator_core::{Board, MoveError, Symbol, CELLS};

/// A player symbol on the wire: `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl From<Symbol> for Mark {
    fn from(s: Symbol) -> Self {
        match s {
            Symbol::X => Mark::X,
            Symbol::O => Mark::O,
        }
    }
}

impl From<Mark> for Symbol {
    fn from(m: Mark) -> Self {
        match m {
            Mark::X => Symbol::X,
            Mark::O => Symbol::O,
        }
    }
}

/// Board snapshot on the wire: nine cells, `null` for empty.
pub type WireBoard = [Option<Mark>; CELLS];

/// Convert a core board into its wire form.
pub fn wire_board(board: &Board) -> WireBoard {
    board.cells().map(|c| c.map(Mark::from))
}

/// Reason code attached to `moveRejected` / `joinRejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Unknown match, or the match is no longer accepting moves.
    NotFound,
    MatchFinished,
    InvalidPosition,
    PositionTaken,
    NotYourTurn,
    NotAPlayer,
    /// The durable store did not answer in time; safe to retry.
    StoreUnavailable,
}

impl From<&MoveError> for RejectReason {
    fn from(e: &MoveError) -> Self {
        match e {
            MoveError::MatchFinished => RejectReason::MatchFinished,
            MoveError::InvalidPosition(_) => RejectReason::InvalidPosition,
            MoveError::PositionTaken(_) => RejectReason::PositionTaken,
            MoveError::NotYourTurn => RejectReason::NotYourTurn,
            MoveError::NotAPlayer(_) => RejectReason::NotAPlayer,
        }
    }
}

/// Online/offline state in a `userStatus` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Online,
    Offline,
}

/// Client → gateway events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Handshake; must be the first event on a connection.
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    /// Join (or re-join) a match room.
    #[serde(rename_all = "camelCase")]
    Join { match_id: u64 },

    /// Place a mark. The turn and symbol are *never* client-supplied;
    /// the room derives both from the authoritative state.
    #[serde(rename_all = "camelCase")]
    Move { match_id: u64, position: u8 },

    /// Ask for the current presence snapshot.
    RequestOnlineUsers,
}

/// Gateway → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireEvent {
    /// Handshake succeeded; the connection carries this identity.
    #[serde(rename_all = "camelCase")]
    Authenticated { user_id: u64 },

    /// Handshake failed; the connection is closed after this event.
    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    /// Authoritative board and turn for a room.
    #[serde(rename_all = "camelCase")]
    RoomState {
        match_id: u64,
        board: WireBoard,
        turn: Mark,
    },

    /// Number of sessions currently in a room.
    #[serde(rename_all = "camelCase")]
    PeerCount { match_id: u64, count: usize },

    /// Terminal outcome; `winner` is `null` for a tie.
    #[serde(rename_all = "camelCase")]
    GameOver {
        match_id: u64,
        winner: Option<Mark>,
        board: WireBoard,
    },

    /// Presence snapshot (deduplicated user ids).
    #[serde(rename_all = "camelCase")]
    OnlineUsers { ids: Vec<u64> },

    /// A user's first session came online / last session went away.
    #[serde(rename_all = "camelCase")]
    UserStatus { user_id: u64, state: PresenceState },

    /// A move was rejected; the connection stays open.
    #[serde(rename_all = "camelCase")]
    MoveRejected { match_id: u64, reason: RejectReason },

    /// A join was rejected (unknown match or unservable room).
    #[serde(rename_all = "camelCase")]
    JoinRejected { match_id: u64, reason: RejectReason },
}
