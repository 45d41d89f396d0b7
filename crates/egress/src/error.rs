use thiserror::Error;

/// Errors that can occur while publishing outbound events.
#[derive(Debug, Error)]
pub enum EgressError {
    /// The event payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The bus rejected or failed the publish.
    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Result type for egress operations.
pub type Result<T> = std::result::Result<T, EgressError>;
