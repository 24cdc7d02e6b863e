//! Server execution logic.

use std::sync::Arc;

use axum::{Router, http::Method, routing::get};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::common::time::SystemClock;

use super::{
    handler::{chat_page, health_check, websocket_handler},
    registry::ConnectionRegistry,
    signal::shutdown_signal,
    state::AppState,
    timer::{TIME_BROADCAST_INTERVAL, spawn_time_broadcaster},
};

/// Build the relay's router.
///
/// CORS allows GET/PATCH/POST/PUT from the requesting origin, with
/// credentials.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PATCH, Method::POST, Method::PUT])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);

    Router::new()
        // Chat page
        .route("/", get(chat_page))
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // HTTP endpoint
        .route("/api/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the chat relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 3000)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Create the connection registry shared by handlers and the timer
    let registry = Arc::new(ConnectionRegistry::new());
    let state = Arc::new(AppState::new(registry.clone()));

    // Start the periodic time broadcast
    let timer = spawn_time_broadcaster(registry, Arc::new(SystemClock), TIME_BROADCAST_INTERVAL);

    let app = app(state);

    // Bind the server to the host and port
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    // Start the server
    tracing::info!("Chat relay server listening on {}", listener.local_addr()?);
    tracing::info!("Chat page: http://{}/", bind_addr);
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // Set up graceful shutdown signal handler
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    timer.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}
