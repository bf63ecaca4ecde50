//! Errors that stop the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server stopped unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}
