//! WebSocket chat relay library.
//!
//! This library provides server and client implementations for a minimal
//! WebSocket chat relay: inbound chat messages are broadcast to every other
//! connected client, and the server pushes a timestamp event to all clients
//! every 10 seconds.

pub mod client;
pub mod common;
pub mod protocol;
pub mod server;
