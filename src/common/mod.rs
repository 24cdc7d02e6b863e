//! Shared utilities used by both the server and client binaries.

pub mod logger;
pub mod time;
