//! WebSocket chat relay server implementation.

mod handler;
mod registry;
mod runner;
mod signal;
mod state;
mod timer;

pub use registry::{ConnectionId, ConnectionRegistry, DeliveryError};
pub use runner::{app, run_server};
pub use state::AppState;
pub use timer::{TIME_BROADCAST_INTERVAL, spawn_time_broadcaster};
