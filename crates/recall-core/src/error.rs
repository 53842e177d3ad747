use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding timed out after {0:?}")]
    EmbeddingTimeout(Duration),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index snapshot invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Malformed knowledge base {}: {source}", path.display())]
    KnowledgeBase {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the failures a query recovers from by ranking lexically.
    pub fn is_embedding_failure(&self) -> bool {
        matches!(self, Error::EmbeddingUnavailable(_) | Error::EmbeddingTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
