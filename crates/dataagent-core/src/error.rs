use thiserror::Error;

/// Top-level error type for DataAgent.
///
/// Storage and configuration failures land here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataAgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DataAgentError {
    fn from(err: toml::de::Error) -> Self {
        DataAgentError::Config(err.to_string())
    }
}

/// A specialized `Result` type for DataAgent operations.
pub type Result<T> = std::result::Result<T, DataAgentError>;
