//! Network module.
//!
//! Contains the Gateway (TCP listener) and the per-client Connection task of
//! the JSON-lines command socket.

mod connection;
mod gateway;

pub use connection::{Connection, encode_reply};
pub use gateway::Gateway;

/// Source tag stamped on every command received over the socket.
pub const SOCKET_SOURCE: &str = "socket";
