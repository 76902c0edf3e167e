//! The 3x3 board.
//!
//! Cells are indexed 0..=8 in row-major order:
//!
//! ```text
//! 0 | 1 | 2
//! --+---+--
//! 3 | 4 | 5
//! --+---+--
//! 6 | 7 | 8
//! ```
//!
//! Occupancy is monotonic for the lifetime of a room: once a cell is
//! set it is never cleared.

use crate::symbol::Symbol;

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// A 3x3 board; `None` means the cell is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([Option<Symbol>; CELLS]);

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Board::default()
    }

    /// True if `position` addresses a cell on the board.
    pub fn in_bounds(position: u8) -> bool {
        (position as usize) < CELLS
    }

    /// Occupant of the given cell, if any.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds; callers validate first.
    pub fn cell(&self, position: u8) -> Option<Symbol> {
        self.0[position as usize]
    }

    /// Mark a cell. The caller guarantees the cell is empty and in
    /// bounds; this is the only way a cell changes.
    pub(crate) fn mark(&mut self, position: u8, symbol: Symbol) {
        debug_assert!(self.0[position as usize].is_none());
        self.0[position as usize] = Some(symbol);
    }

    /// True once every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.0.iter().all(|c| c.is_some())
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|c| c.is_some()).count()
    }

    /// Raw cell array, for snapshots and wire encoding.
    pub fn cells(&self) -> &[Option<Symbol>; CELLS] {
        &self.0
    }
}
