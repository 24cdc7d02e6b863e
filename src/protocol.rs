//! Wire protocol for the chat relay.
//!
//! Every WebSocket text frame carries one event as a tagged JSON envelope:
//! `{"event": "<name>", "data": <payload>}`. Event names mirror the ones the
//! chat page listens for, so the page and the CLI client speak the same
//! protocol.

use serde::{Deserialize, Serialize};

/// Diagnostic reply text sent back for every `clientMessage` event.
pub const SERVER_RESPONSE_TEXT: &str = "Received message! Returning message!!";

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Diagnostic ping; the server replies with [`ServerEvent::ServerResponse`].
    ClientMessage { message: String },
    /// Chat text to relay to every other connected client, verbatim.
    SendChatToServer(String),
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Diagnostic reply, unicast to the client that sent a `clientMessage`.
    ServerResponse { message: String },
    /// Periodic timestamp, broadcast to all connected clients.
    Time { time: String },
    /// Relayed chat text, broadcast to all clients except the sender.
    SendChatToClient(String),
}

impl ServerEvent {
    /// Serialize the event to its JSON wire form.
    ///
    /// Serialization of these enums cannot fail, so this is infallible.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerEvent serialization cannot fail")
    }
}

impl ClientEvent {
    /// Serialize the event to its JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ClientEvent serialization cannot fail")
    }
}
