//! Connection registry: the live connection set and message fan-out.
//!
//! The registry is the only shared state the relay holds. It maps opaque
//! connection identifiers to the outbound channel of each connection and
//! performs unicast (`send_to`) and fan-out (`broadcast`) delivery. The
//! WebSocket itself is created in the handler layer; the registry only sees
//! the `UnboundedSender` side of each connection's outbound channel.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

/// Opaque identifier for one active connection, assigned on registration.
///
/// A client that reconnects gets a fresh identifier; no linking is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors raised by unicast delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The target connection is not registered (already disconnected)
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(ConnectionId),

    /// The target connection's channel is closed
    #[error("Failed to send to connection '{0}': {1}")]
    SendFailed(ConnectionId, String),
}

/// Registry of all currently connected clients.
///
/// Membership is guarded by a single async mutex; broadcast is a non-blocking
/// fan-out over the current connection set (sends go through unbounded
/// channels, so holding the lock never waits on a slow receiver).
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new connection and return its freshly assigned identifier.
    pub async fn register(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = ConnectionId::generate();
        let mut connections = self.connections.lock().await;
        connections.insert(id, sender);
        tracing::debug!("Connection '{}' registered", id);
        id
    }

    /// Remove a connection from the registry.
    ///
    /// Deregistering an unknown identifier is a no-op.
    pub async fn deregister(&self, id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(id);
        tracing::debug!("Connection '{}' deregistered", id);
    }

    /// Send a payload to one specific connection.
    pub async fn send_to(&self, id: &ConnectionId, payload: &str) -> Result<(), DeliveryError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(id) {
            sender
                .send(payload.to_string())
                .map_err(|e| DeliveryError::SendFailed(*id, e.to_string()))?;
            tracing::debug!("Sent payload to connection '{}'", id);
            Ok(())
        } else {
            Err(DeliveryError::ConnectionNotFound(*id))
        }
    }

    /// Broadcast a payload to every connection except `excluding` (if any).
    ///
    /// Per-recipient send failures are tolerated and logged; delivery to the
    /// remaining recipients proceeds independently. Returns the number of
    /// connections the payload was handed to.
    pub async fn broadcast(&self, payload: &str, excluding: Option<&ConnectionId>) -> usize {
        let connections = self.connections.lock().await;

        let mut delivered = 0;
        for (id, sender) in connections.iter() {
            if Some(id) == excluding {
                continue;
            }
            if let Err(e) = sender.send(payload.to_string()) {
                tracing::warn!("Failed to send payload to connection '{}': {}", id, e);
            } else {
                delivered += 1;
            }
        }

        delivered
    }

    /// Number of currently registered connections.
    pub async fn count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
