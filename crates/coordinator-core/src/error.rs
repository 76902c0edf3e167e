//! Error types for the core match-session logic.
//!
//! Two distinct failure families:
//! - [`MoveError`]: client-correctable rejections of a proposed move.
//!   These terminate only the offending request; no state is mutated.
//! - [`HydrationError`]: the persisted move log cannot be replayed into
//!   a legal board. Fatal for that room only; the server refuses to
//!   serve the match rather than serve a corrupted board.

use thiserror::Error;

use crate::records::UserId;

/// Rejection of a proposed move. Checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The match is no longer accepting moves.
    #[error("match is not ongoing")]
    MatchFinished,

    /// Position outside 0..=8.
    #[error("position {0} is outside the board")]
    InvalidPosition(u8),

    /// The cell is already occupied.
    #[error("position {0} is already taken")]
    PositionTaken(u8),

    /// The sender is a player of this match but it is not their turn.
    #[error("not this player's turn")]
    NotYourTurn,

    /// The sender is not one of the match's two players.
    #[error("user {} is not a player in this match", .0 .0)]
    NotAPlayer(UserId),
}

/// The persisted move log does not reconstruct a legal game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HydrationError {
    /// Move sequence numbers are not 1..=n with no gaps.
    #[error("move sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u32, found: u32 },

    /// A logged position is outside the board.
    #[error("move {sequence} has out-of-range position {position}")]
    PositionOutOfRange { sequence: u32, position: u8 },

    /// Two logged moves target the same cell.
    #[error("move {sequence} targets occupied position {position}")]
    PositionOccupied { sequence: u32, position: u8 },

    /// A logged move belongs to neither player of the match.
    #[error("move {sequence} by user {} who is not a match player", player.0)]
    UnknownPlayer { sequence: u32, player: UserId },

    /// A logged move is out of turn for its sequence parity.
    #[error("move {sequence} played out of turn")]
    OutOfTurn { sequence: u32 },

    /// Moves continue past a terminal board.
    #[error("move {sequence} logged after the game ended")]
    MoveAfterEnd { sequence: u32 },
}
