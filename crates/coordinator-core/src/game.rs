//! Per-match game state: the authoritative board/turn state machine.
//!
//! One [`GameState`] backs one resident room. It is pure, single-owner
//! state; the server serializes all access through a per-room task, so
//! no locking happens here.
//!
//! Mutation is two-phase so that the in-memory board only advances
//! once the durable append has succeeded:
//! - [`GameState::propose`] validates a move and stages it (no state
//!   change).
//! - [`GameState::commit`] marks the cell, bumps the move count, and
//!   evaluates the outcome.
//!
//! If the durable append fails, the staged move is simply dropped and
//! the state is exactly as before -- no partial application.

use crate::board::Board;
use crate::error::{HydrationError, MoveError};
use crate::outcome::{self, Outcome};
use crate::records::{MatchRecord, MatchStatus, MoveRecord, UserId};
use crate::symbol::Symbol;

/// A validated move that has not yet been applied.
///
/// Produced by [`GameState::propose`]; carries everything the server
/// needs for the durable append. Deliberately not constructible
/// outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedMove {
    player: UserId,
    symbol: Symbol,
    position: u8,
    sequence: u32,
}

impl StagedMove {
    pub fn player(&self) -> UserId {
        self.player
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    /// Room-assigned sequence number for the durable log (1-based).
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// Result of committing a staged move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveApplied {
    pub sequence: u32,
    pub symbol: Symbol,
    pub position: u8,

    /// Outcome of the board after this move.
    pub outcome: Outcome,

    /// Whose turn it is next; `None` once the game is over.
    pub next_turn: Option<Symbol>,
}

/// Authoritative in-memory state for one match.
#[derive(Debug, Clone)]
pub struct GameState {
    record: MatchRecord,
    board: Board,

    /// Number of moves applied; also the highest persisted sequence.
    applied: u32,

    /// Set when hydration derived a terminal outcome the stored status
    /// had missed (a lost status write); the owner should re-persist.
    status_repaired: bool,
}

impl GameState {
    /// State for a match with no prior moves.
    pub fn new(record: MatchRecord) -> Self {
        GameState {
            record,
            board: Board::new(),
            applied: 0,
            status_repaired: false,
        }
    }

    /// Reconstruct state by replaying a persisted move log.
    ///
    /// `moves` must be ascending by sequence (the store contract).
    /// Every move is re-validated; any illegality means the log cannot
    /// be trusted and the whole hydration fails.
    ///
    /// Symbols are derived strictly from the stored first-mover
    /// identity (`record.player_x`), never from array position alone.
    pub fn hydrate(record: MatchRecord, moves: &[MoveRecord]) -> Result<Self, HydrationError> {
        let mut state = GameState::new(record);

        for (i, mv) in moves.iter().enumerate() {
            let expected = (i as u32) + 1;
            if mv.sequence != expected {
                return Err(HydrationError::SequenceGap {
                    expected,
                    found: mv.sequence,
                });
            }

            if outcome::evaluate(&state.board).is_terminal() {
                return Err(HydrationError::MoveAfterEnd {
                    sequence: mv.sequence,
                });
            }

            if !Board::in_bounds(mv.position) {
                return Err(HydrationError::PositionOutOfRange {
                    sequence: mv.sequence,
                    position: mv.position,
                });
            }

            if state.board.cell(mv.position).is_some() {
                return Err(HydrationError::PositionOccupied {
                    sequence: mv.sequence,
                    position: mv.position,
                });
            }

            let symbol = match state.symbol_of(mv.player) {
                Some(s) => s,
                None => {
                    return Err(HydrationError::UnknownPlayer {
                        sequence: mv.sequence,
                        player: mv.player,
                    })
                }
            };

            // Odd sequence belongs to the first mover (X).
            if symbol != state.turn() {
                return Err(HydrationError::OutOfTurn {
                    sequence: mv.sequence,
                });
            }

            state.board.mark(mv.position, symbol);
            state.applied += 1;
        }

        // Reconcile the replayed outcome with the stored status. A
        // terminal board with a stored `Ongoing` status means the
        // status write was lost; adopt the derived outcome and let the
        // owner re-persist it. A stored terminal status is one-way and
        // is trusted as-is.
        if state.record.status == MatchStatus::Ongoing {
            match outcome::evaluate(&state.board) {
                Outcome::Winner(symbol) => {
                    state.record.status = MatchStatus::Completed;
                    state.record.winner = Some(state.player_of(symbol));
                    state.status_repaired = true;
                }
                Outcome::Tie => {
                    state.record.status = MatchStatus::Tied;
                    state.status_repaired = true;
                }
                Outcome::InProgress => {}
            }
        }

        Ok(state)
    }

    /// True when hydration had to derive a terminal status the store
    /// still records as `Ongoing`.
    pub fn status_repaired(&self) -> bool {
        self.status_repaired
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> MatchStatus {
        self.record.status
    }

    /// Symbol whose turn it is, derived from move-count parity: an
    /// even number of applied moves means the first mover (X) is up.
    pub fn turn(&self) -> Symbol {
        if self.applied % 2 == 0 {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    /// Sequence number the next committed move will carry.
    pub fn next_sequence(&self) -> u32 {
        self.applied + 1
    }

    /// Which symbol the given user plays, if they are a player here.
    pub fn symbol_of(&self, user: UserId) -> Option<Symbol> {
        if user == self.record.player_x {
            Some(Symbol::X)
        } else if user == self.record.player_o {
            Some(Symbol::O)
        } else {
            None
        }
    }

    /// The user holding the given symbol.
    pub fn player_of(&self, symbol: Symbol) -> UserId {
        match symbol {
            Symbol::X => self.record.player_x,
            Symbol::O => self.record.player_o,
        }
    }

    /// Validate a move without applying it.
    ///
    /// Checks, in order: match still ongoing, position on the board,
    /// cell free, and finally that the sender holds the symbol whose
    /// turn it is. Turn is derived from move-count parity against the
    /// stored first mover -- a client-declared turn is never trusted.
    pub fn propose(&self, player: UserId, position: u8) -> Result<StagedMove, MoveError> {
        if self.record.status != MatchStatus::Ongoing {
            return Err(MoveError::MatchFinished);
        }

        if !Board::in_bounds(position) {
            return Err(MoveError::InvalidPosition(position));
        }

        if self.board.cell(position).is_some() {
            return Err(MoveError::PositionTaken(position));
        }

        let symbol = self
            .symbol_of(player)
            .ok_or(MoveError::NotAPlayer(player))?;
        if symbol != self.turn() {
            return Err(MoveError::NotYourTurn);
        }

        Ok(StagedMove {
            player,
            symbol,
            position,
            sequence: self.next_sequence(),
        })
    }

    /// Apply a previously staged move.
    ///
    /// Call only after the durable append for `staged` has succeeded,
    /// and only with a move staged against the current state.
    pub fn commit(&mut self, staged: StagedMove) -> MoveApplied {
        debug_assert_eq!(staged.sequence, self.next_sequence());

        self.board.mark(staged.position, staged.symbol);
        self.applied += 1;

        let outcome = outcome::evaluate(&self.board);
        let next_turn = match outcome {
            Outcome::Winner(symbol) => {
                self.record.status = MatchStatus::Completed;
                self.record.winner = Some(self.player_of(symbol));
                None
            }
            Outcome::Tie => {
                self.record.status = MatchStatus::Tied;
                None
            }
            Outcome::InProgress => Some(staged.symbol.other()),
        };

        MoveApplied {
            sequence: staged.sequence,
            symbol: staged.symbol,
            position: staged.position,
            outcome,
            next_turn,
        }
    }
}
