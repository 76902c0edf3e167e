//! coordinator-protocol
//!
//! Wire-level encoding/decoding for the session coordinator.
//!
//! This crate is responsible for turning logical gateway events into
//! bytes and back again:
//!
//! - [`events`]     : tagged event shapes (client → gateway, gateway → client)
//! - [`json_codec`] : newline-delimited JSON framing

pub mod events;
pub mod json_codec;

pub use events::{
    wire_board, ClientEvent, Mark, PresenceState, RejectReason, WireBoard, WireEvent,
};
pub use json_codec::{
    decode_client_line, decode_server_line, encode_client_event, encode_server_event,
    ProtocolError,
};
