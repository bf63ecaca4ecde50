//! Command line and environment configuration.

use clap::Parser;

use crate::ui::ServerConfig;

/// WebRTC signaling server
#[derive(Debug, Parser)]
#[command(name = "huddle-server", version, about)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HUDDLE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Allowed CORS origin; repeat or comma-separate for several, `*` for any
    #[arg(
        long = "allowed-origin",
        env = "HUDDLE_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "HUDDLE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            allowed_origins: self
                .allowed_origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }
}
