//! coordinator-server
//!
//! Multi-client async TCP session coordinator: gateway, room registry,
//! per-room single-consumer tasks, store and identity seams.

pub mod auth;
pub mod config;
pub mod registry;
pub mod server;
pub mod store;
pub mod types;

// these are internal modules, not re-exported
mod room;
mod session;
