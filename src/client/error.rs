//! Error types for the CLI chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to establish the WebSocket connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The connection was lost mid-session
    #[error("Connection lost")]
    ConnectionLost,
}
