//! Logger setup shared by Huddle binaries.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise the crate that owns `bin_name`
/// and `tower_http` are logged at `default_level`.
///
/// Calling this more than once is a no-op.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(bin_name, default_level)));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logger initialized for {}", bin_name);
    }
}

fn default_directives(bin_name: &str, default_level: &str) -> String {
    // binary names use dashes, module targets use underscores
    let target = bin_name.replace('-', "_");
    format!("{target}={default_level},tower_http={default_level}")
}
