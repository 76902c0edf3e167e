//! coordinator-core
//!
//! Pure match-session logic:
//! - durable record types (matches, moves)
//! - the 3x3 board and player symbols
//! - outcome evaluation (win / tie detection)
//! - per-match game state machine with hydration replay

pub mod board;
pub mod error;
pub mod game;
pub mod outcome;
pub mod records;
pub mod symbol;

pub use board::{Board, CELLS};
pub use error::{HydrationError, MoveError};
pub use game::{GameState, MoveApplied, StagedMove};
pub use outcome::{evaluate, Outcome, WINNING_LINES};
pub use records::{MatchId, MatchRecord, MatchStatus, MoveRecord, UserId};
pub use symbol::Symbol;
