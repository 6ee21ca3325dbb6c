//! Error types for Topograph Core

use thiserror::Error;

/// Result type alias using Topograph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of every error the engine can raise.
///
/// Callers decide retry/report behaviour on the kind, never on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or contradictory rules, malformed definitions. Always fatal.
    Configuration,
    /// A requested vertex, model or named query does not exist.
    NotFound,
    /// Depth, result-count or wall-clock budget exhausted.
    LimitExceeded,
    /// A removal target was already gone.
    PartialDelete,
    /// Lock poisoning, worker panics, serialization.
    Internal,
}

/// Topograph error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("No edge rule defined between {0} and {1}")]
    MissingEdgeRule(String, String),

    #[error("Contradictory edge rules for {0}|{1}")]
    ConflictingEdgeRule(String, String),

    #[error("Invalid model definition: {0}")]
    InvalidModel(String),

    #[error("Invalid named query definition: {0}")]
    InvalidNamedQuery(String),

    #[error("Model element {element} is reachable from itself")]
    ModelCycle { element: String },

    #[error("Model definition nests deeper than {max} levels")]
    ModelTooDeep { max: u32 },

    #[error("Root vertex has node type {found}, topology starts at {expected}")]
    RootTypeMismatch { expected: String, found: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vertex not found: {0}")]
    VertexNotFound(String),

    #[error("Model not found: {model_id} version {model_version}")]
    ModelNotFound {
        model_id: String,
        model_version: String,
    },

    #[error("Named query not found: {0}")]
    NamedQueryNotFound(String),

    #[error("No start vertex found for {0}")]
    NoStartVertex(String),

    #[error("Traversal exceeded {max} levels")]
    DepthExceeded { max: u32 },

    #[error("Result set exceeded {max} nodes")]
    ResultLimitExceeded { max: usize },

    #[error("Query timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Resource version mismatch on {id}: expected {expected}, found {found}")]
    ResourceVersionMismatch {
        id: String,
        expected: String,
        found: String,
    },

    #[error("Root vertex {0} is already gone")]
    RootAlreadyRemoved(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingEdgeRule(..)
            | Self::ConflictingEdgeRule(..)
            | Self::InvalidModel(_)
            | Self::InvalidNamedQuery(_)
            | Self::ModelCycle { .. }
            | Self::ModelTooDeep { .. }
            | Self::RootTypeMismatch { .. }
            | Self::Configuration(_) => ErrorKind::Configuration,
            Self::VertexNotFound(_)
            | Self::ModelNotFound { .. }
            | Self::NamedQueryNotFound(_)
            | Self::NoStartVertex(_) => ErrorKind::NotFound,
            Self::DepthExceeded { .. }
            | Self::ResultLimitExceeded { .. }
            | Self::Timeout { .. } => ErrorKind::LimitExceeded,
            Self::ResourceVersionMismatch { .. } | Self::RootAlreadyRemoved(_) => {
                ErrorKind::PartialDelete
            }
            Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::MissingEdgeRule("a".into(), "b".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::ModelCycle {
                element: "e1".into()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::Timeout { secs: 5 }.kind(), ErrorKind::LimitExceeded);
        assert!(Error::VertexNotFound("v1".into()).is_not_found());
        assert_eq!(
            Error::RootAlreadyRemoved("v1".into()).kind(),
            ErrorKind::PartialDelete
        );
    }
}
