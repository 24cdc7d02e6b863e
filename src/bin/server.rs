//! Minimal WebSocket chat relay server.
//!
//! Broadcasts each received chat message to all other connected clients and
//! pushes a timestamp event to every client each 10 seconds.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;

use chat_relay_rs::common::logger::setup_logger;
use chat_relay_rs::server::run_server;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "WebSocket chat relay server with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
