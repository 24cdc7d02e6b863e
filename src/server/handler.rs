//! WebSocket connection handlers and event dispatch.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{Html, IntoResponse},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::protocol::{ClientEvent, SERVER_RESPONSE_TEXT, ServerEvent};

use super::{
    registry::{ConnectionId, ConnectionRegistry},
    state::AppState,
};

/// Serve the embedded chat page.
pub async fn chat_page() -> Html<&'static str> {
    Html(include_str!("../../assets/chat.html"))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive outbound payloads
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection_id = state.registry.register(tx).await;
    tracing::info!("Connection '{}' established", connection_id);

    let registry = state.registry.clone();

    // Spawn a task to receive messages from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Parse the incoming frame as a tagged event
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(
                                "Ignoring malformed payload from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    dispatch_client_event(&registry, &connection_id, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward outbound payloads to this connection's socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.registry.deregister(&connection_id).await;
    tracing::info!("Connection '{}' disconnected", connection_id);
}

/// Dispatch one inbound event from connection `from`.
///
/// Delivery is fire-and-forget: failures are logged and never fault the
/// originating connection.
pub async fn dispatch_client_event(
    registry: &ConnectionRegistry,
    from: &ConnectionId,
    event: ClientEvent,
) {
    match event {
        ClientEvent::SendChatToServer(message) => {
            tracing::info!("Chat from '{}': {}", from, message);

            // Relay verbatim to every other connection
            let payload = ServerEvent::SendChatToClient(message).to_json();
            let delivered = registry.broadcast(&payload, Some(from)).await;
            tracing::info!(
                "Broadcasted chat from '{}' to {} connection(s)",
                from,
                delivered
            );
        }
        ClientEvent::ClientMessage { message } => {
            tracing::info!("Diagnostic message from '{}': {}", from, message);

            let reply = ServerEvent::ServerResponse {
                message: SERVER_RESPONSE_TEXT.to_string(),
            }
            .to_json();
            if let Err(e) = registry.send_to(from, &reply).await {
                tracing::warn!("Failed to send diagnostic reply to '{}': {}", from, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn connect(registry: &ConnectionRegistry) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_chat_is_relayed_to_others_but_not_sender() {
        // テスト項目: チャットが送信者以外の全接続に中継される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (alice, mut alice_rx) = connect(&registry).await;
        let (_bob, mut bob_rx) = connect(&registry).await;
        let (_charlie, mut charlie_rx) = connect(&registry).await;

        // when (操作):
        dispatch_client_event(
            &registry,
            &alice,
            ClientEvent::SendChatToServer("hello".to_string()),
        )
        .await;

        // then (期待する結果):
        let expected = r#"{"event":"sendChatToClient","data":"hello"}"#;
        assert_eq!(bob_rx.recv().await.as_deref(), Some(expected));
        assert_eq!(charlie_rx.recv().await.as_deref(), Some(expected));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chat_is_relayed_verbatim() {
        // テスト項目: マークアップを含むチャットも無加工で中継される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (alice, _alice_rx) = connect(&registry).await;
        let (_bob, mut bob_rx) = connect(&registry).await;

        // when (操作):
        dispatch_client_event(
            &registry,
            &alice,
            ClientEvent::SendChatToServer("<b>bold</b>".to_string()),
        )
        .await;

        // then (期待する結果):
        let received = bob_rx.recv().await.unwrap();
        let event: ServerEvent = serde_json::from_str(&received).unwrap();
        assert_eq!(
            event,
            ServerEvent::SendChatToClient("<b>bold</b>".to_string())
        );
    }

    #[tokio::test]
    async fn test_chat_with_single_connection_delivers_nothing() {
        // テスト項目: 送信者しかいない場合、チャットはどこにも配送されない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (alice, mut alice_rx) = connect(&registry).await;

        // when (操作):
        dispatch_client_event(
            &registry,
            &alice,
            ClientEvent::SendChatToServer("hello".to_string()),
        )
        .await;

        // then (期待する結果):
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_client_message_gets_reply_to_sender_only() {
        // テスト項目: clientMessage への応答が送信者のみに返される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (alice, mut alice_rx) = connect(&registry).await;
        let (_bob, mut bob_rx) = connect(&registry).await;

        // when (操作):
        dispatch_client_event(
            &registry,
            &alice,
            ClientEvent::ClientMessage {
                message: "Sent from client!".to_string(),
            },
        )
        .await;

        // then (期待する結果):
        let received = alice_rx.recv().await.unwrap();
        let event: ServerEvent = serde_json::from_str(&received).unwrap();
        assert_eq!(
            event,
            ServerEvent::ServerResponse {
                message: SERVER_RESPONSE_TEXT.to_string(),
            }
        );
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_client_message_from_gone_connection_does_not_fault() {
        // テスト項目: 応答先の接続が消えていてもディスパッチは失敗しない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (alice, alice_rx) = connect(&registry).await;
        drop(alice_rx);
        registry.deregister(&alice).await;

        // when (操作):
        dispatch_client_event(
            &registry,
            &alice,
            ClientEvent::ClientMessage {
                message: "Sent from client!".to_string(),
            },
        )
        .await;

        // then (期待する結果):
        // 警告ログのみで、パニックやエラー伝播は起きない
        assert_eq!(registry.count().await, 0);
    }
}
