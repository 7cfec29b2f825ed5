use std::path::PathBuf;

/// The rules document or settings file could not be turned into usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Rules file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rules document: {0}")]
    Rules(#[from] serde_json::Error),

    #[error("Invalid settings file: {0}")]
    Settings(#[from] toml::de::Error),
}

/// Typed outcome of a failed call against the remote mailbox.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("Label '{0}' was created without an id")]
    MissingLabelId(String),
}

impl GatewayError {
    pub fn request(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Request {
            operation,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load records: {0:#}")]
    Store(anyhow::Error),
}
