//! Shared types for the session coordinator server.
//!
//! This module defines:
//! - `SessionId`: a lightweight handle for connected sessions
//! - `SessionHandle`: identity + outbound channel for one session
//! - channel aliases between session tasks and room tasks
//! - `RoomRequest`: messages flowing from sessions into a room task

use std::collections::HashMap;
use std::sync::Arc;

use coordinator_core::UserId;
use coordinator_protocol::WireEvent;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

/// Identifier for a live connection.
///
/// This is intentionally opaque; we just guarantee uniqueness over the
/// lifetime of the process. Rooms and the presence registry hold these
/// instead of direct session references, so there are no ownership
/// cycles between sessions and rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Outbound events from the server to a given session.
pub type OutboundTx = mpsc::UnboundedSender<WireEvent>;
pub type OutboundRx = mpsc::UnboundedReceiver<WireEvent>;

/// Delivery handle for one authenticated session: who it is and how
/// to reach its writer task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub tx: OutboundTx,
}

/// Process-wide presence registry of authenticated sessions.
///
/// - Key: `SessionId`
/// - Value: `SessionHandle` for identity checks and event fan-out.
pub type ClientRegistry = Arc<RwLock<HashMap<SessionId, SessionHandle>>>;

/// Message flowing from a session task into a room task.
///
/// Each room task processes these strictly one at a time; the channel
/// is the mutual-exclusion region for that match's state.
#[derive(Debug)]
pub enum RoomRequest {
    /// A session joins (or re-joins) the room.
    Join { session: SessionHandle },

    /// A session left the room (disconnect).
    Leave { session_id: SessionId },

    /// A move attempt. Identity comes from the authenticated session,
    /// never from the wire payload.
    Move {
        session_id: SessionId,
        user_id: UserId,
        position: u8,
    },
}

/// Channel from sessions into one room task.
pub type RoomTx = mpsc::UnboundedSender<RoomRequest>;
pub type RoomRx = mpsc::UnboundedReceiver<RoomRequest>;
