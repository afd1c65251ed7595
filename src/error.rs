use thiserror::Error;

/// Unified error type for version-publish operations
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Container engine failed: {0}")]
    Container(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results in version-publish
pub type Result<T> = std::result::Result<T, PublishError>;

/// Coarse classification of a [PublishError]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad inputs, environment or tag history
    Configuration,
    /// The version-control client or the container engine reported a failure
    ExternalTool,
    /// Local filesystem or encoding failure
    Io,
}

impl PublishError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PublishError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        PublishError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        PublishError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        PublishError::Remote(msg.into())
    }

    /// Create a container engine error with context
    pub fn container(msg: impl Into<String>) -> Self {
        PublishError::Container(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::Config(_) | PublishError::Version(_) => ErrorKind::Configuration,
            PublishError::Git(_)
            | PublishError::Tag(_)
            | PublishError::Remote(_)
            | PublishError::Container(_) => ErrorKind::ExternalTool,
            PublishError::Io(_) | PublishError::Serialization(_) => ErrorKind::Io,
        }
    }
}
