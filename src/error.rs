//! Error types shared across the proxy.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while decoding or encoding DNS messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Format(String),

    #[error("name at offset {0} does not terminate")]
    NameLoop(usize),

    #[error("no payload encoder for record type {0}")]
    UnsupportedRecordType(String),
}

impl WireError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        WireError::Format(msg.into())
    }
}

/// Errors raised while forwarding a query upstream.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A single upstream failed: connect, timeout, I/O or a bad response.
    #[error("upstream {server} failed: {reason}")]
    Attempt { server: SocketAddr, reason: String },

    #[error("all {0} upstream servers failed")]
    Exhausted(usize),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("configuration validation error: {0}")]
    Validation(String),
}
