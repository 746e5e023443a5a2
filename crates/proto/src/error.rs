use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Network transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Terminal surface error.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// A send or disconnect was attempted while no connection exists.
    #[error("Not connected")]
    NotConnected,

    /// The connection attempt itself could not be issued.
    #[error("Connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// Writing to the connection failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// The transport task is gone and can no longer accept requests.
    #[error("Transport closed")]
    Closed,
}

/// Terminal surface errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Terminal IO failure (raw mode, drawing, size query).
    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}
