//! Error types shared across the gateway.

use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {key} must be valid, got '{value}'")]
    Malformed { key: &'static str, value: String },

    #[error("Config error: {key} {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Config error: unsupported stream backend '{0}'")]
    UnsupportedBackend(String),
}

/// Errors reported by a stream client.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Poll called before any topic was subscribed. Not a real failure.
    #[error("consumer is not subscribed to any topic")]
    NotSubscribed,

    #[error("stream client is closed")]
    Closed,

    #[error("stream client error: {0}")]
    Client(String),
}

/// Top level error for the binary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("task failed: {0}")]
    Task(String),
}
