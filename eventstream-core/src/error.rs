//! Error types for eventstream-core

use thiserror::Error;

/// Main error type for the eventstream-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (DNS, connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Store or website scope could not be resolved
    #[error("scope error: {0}")]
    Scope(String),

    /// Collector/API error
    #[error("collector error: {0}")]
    Collector(String),
}

impl Error {
    /// Render the chain of underlying causes, one per line.
    ///
    /// The first line is the error itself, followed by each `source()`.
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("#0 {}", self)];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            lines.push(format!("#{} {}", lines.len(), cause));
            source = std::error::Error::source(cause);
        }
        lines.join("\n")
    }
}

/// Result type alias for eventstream-core
pub type Result<T> = std::result::Result<T, Error>;
