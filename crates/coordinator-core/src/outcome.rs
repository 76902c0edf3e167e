//! Outcome evaluation: pure win/tie detection over a board snapshot.

use crate::board::Board;
use crate::symbol::Symbol;

/// The eight winning lines: 3 rows, 3 columns, 2 diagonals.
pub const WINNING_LINES: [[u8; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Result of evaluating a board snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one cell is empty and no line is complete.
    InProgress,
    /// The given symbol holds a complete line.
    Winner(Symbol),
    /// The board is full with no complete line.
    Tie,
}

impl Outcome {
    /// True for `Winner` and `Tie`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Evaluate a board snapshot.
///
/// Deterministic and side-effect free; used identically at
/// move-application time and when re-deriving an outcome from a
/// replayed move log.
pub fn evaluate(board: &Board) -> Outcome {
    for line in &WINNING_LINES {
        if let Some(symbol) = board.cell(line[0]) {
            if board.cell(line[1]) == Some(symbol) && board.cell(line[2]) == Some(symbol) {
                return Outcome::Winner(symbol);
            }
        }
    }

    if board.is_full() {
        Outcome::Tie
    } else {
        Outcome::InProgress
    }
}
