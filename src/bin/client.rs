//! Simple CLI client for the WebSocket chat relay.
//!
//! Connects to the relay and sends messages from stdin. Each line is relayed
//! to every other connected client; the special line `/ping` sends the
//! diagnostic `clientMessage` event.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin client
//! cargo run --bin client -- --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use chat_relay_rs::client::run_client;
use chat_relay_rs::common::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "CLI client for the WebSocket chat relay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_client(args.url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
