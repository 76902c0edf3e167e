//! Line-delimited JSON codec.
//!
//! One event per line: a single JSON object terminated by `\n`.
//! Blank lines are skipped by the caller; anything else must parse as
//! exactly one tagged event.
//!
//! The same framing is used in both directions; only the event set
//! differs (`ClientEvent` inbound, `WireEvent` outbound).

use std::fmt;

use crate::events::{ClientEvent, WireEvent};

/// Decode/encode failure at the protocol layer.
#[derive(Debug)]
pub enum ProtocolError {
    /// The line is not a well-formed event of the expected set.
    Malformed(String),

    /// An event could not be serialized.
    Encode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(detail) => write!(f, "malformed event: {}", detail),
            ProtocolError::Encode(detail) => write!(f, "encode error: {}", detail),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Parse one line into a client event.
pub fn decode_client_line(line: &str) -> Result<ClientEvent, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode a client event as one line (no trailing newline).
pub fn encode_client_event(event: &ClientEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Parse one line into a server event (used by clients and tests).
pub fn decode_server_line(line: &str) -> Result<WireEvent, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode a server event as one line (no trailing newline).
pub fn encode_server_event(event: &WireEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::Encode(e.to_string()))
}
