//! Player symbol (X / O) for board cells and turn tracking.

/// Player symbol: X or O.
///
/// X is always the first mover of a match; which *user* holds X is
/// decided by the stored match record, never by move-array parity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The symbol that moves after this one.
    pub fn other(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    /// Convert to the char representation (`'X'` / `'O'`),
    /// useful for logs.
    pub fn as_char(self) -> char {
        match self {
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }
}
