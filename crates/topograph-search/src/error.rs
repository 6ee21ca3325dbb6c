//! Search error types

use thiserror::Error;
use topograph_core::ErrorKind;

/// Result type alias for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Search-specific error types
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid start filter: {0}")]
    InvalidFilter(String),

    #[error("No start vertex found for {0}")]
    NoStartVertex(String),

    #[error("Search exceeded {max} levels")]
    MaxLevelsExceeded { max: u32 },

    #[error(transparent)]
    Graph(#[from] topograph_core::Error),
}

impl SearchError {
    /// Classify this error on the engine's error kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFilter(_) => ErrorKind::Configuration,
            Self::NoStartVertex(_) => ErrorKind::NotFound,
            Self::MaxLevelsExceeded { .. } => ErrorKind::LimitExceeded,
            Self::Graph(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_keep_their_kind() {
        let err: SearchError = topograph_core::Error::VertexNotFound("v9".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Vertex not found: v9");
        assert_eq!(
            SearchError::MaxLevelsExceeded { max: 3 }.kind(),
            ErrorKind::LimitExceeded
        );
    }
}
