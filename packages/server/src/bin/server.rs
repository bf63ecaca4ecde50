//! WebRTC signaling server.
//!
//! Brokers room presence, offer/answer/ICE candidate relay and room chat
//! between WebSocket clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-server -- --port 5000
//! ```

use clap::Parser;
use huddle_server::Cli;
use huddle_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    // Run the server
    if let Err(e) = huddle_server::run(cli.server_config()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
