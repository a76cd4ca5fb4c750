//! Error types for ReviewLens

/// Result type alias using ReviewLens's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ReviewLens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested model has missing or unreadable artifacts
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Unrecognized sentiment label or feedback verdict
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// Text could not be turned into a feature vector
    #[error("transform failure: {0}")]
    TransformFailure(String),

    /// The active classifier lacks a requested capability
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Review store errors
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON artifact errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML catalog and config errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model-not-found error
    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Self::ModelNotFound(msg.into())
    }

    /// Create a new invalid-label error
    pub fn invalid_label(msg: impl Into<String>) -> Self {
        Self::InvalidLabel(msg.into())
    }

    /// Create a new transform error
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::TransformFailure(msg.into())
    }

    /// Create a new unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable name, used for metric labels and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelNotFound(_) => "model_not_found",
            Self::InvalidLabel(_) => "invalid_label",
            Self::TransformFailure(_) => "transform_failure",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::Persistence(_) => "persistence_failure",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Yaml(_) => "yaml",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::model_not_found("variantA");
        assert_eq!(err.to_string(), "model not found: variantA");
        assert_eq!(err.kind(), "model_not_found");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.kind(), "io");
    }
}
