use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure categories surfaced at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionError,
    EmbeddingError,
    StoreWriteError,
    StoreReadError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::ExtractionError => "ExtractionError",
            ErrorKind::EmbeddingError => "EmbeddingError",
            ErrorKind::StoreWriteError => "StoreWriteError",
            ErrorKind::StoreReadError => "StoreReadError",
        };
        f.write_str(name)
    }
}

/// Errors produced by the ingestion and query pipelines.
///
/// Every variant aborts the request it occurred in and nothing else.
#[derive(Error, Debug)]
pub enum RagError {
    /// The file extension does not map to a known document format.
    #[error("unsupported file format: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// The document could not be converted to text.
    #[error("failed to extract text from '{name}': {reason}")]
    Extraction { name: String, reason: String },

    /// The embedding model failed or returned malformed output.
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector store write failed: {0}")]
    StoreWrite(String),

    #[error("vector store read failed: {0}")]
    StoreRead(String),
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            RagError::Extraction { .. } => ErrorKind::ExtractionError,
            RagError::Embedding(_) => ErrorKind::EmbeddingError,
            RagError::StoreWrite(_) => ErrorKind::StoreWriteError,
            RagError::StoreRead(_) => ErrorKind::StoreReadError,
        }
    }

    /// True when the request itself was at fault rather than the server.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            RagError::UnsupportedFormat { .. } | RagError::Extraction { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = RagError::UnsupportedFormat { extension: "xyz".to_string() };
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(err.is_caller_error());
        assert_eq!(err.to_string(), "unsupported file format: 'xyz'");

        let err = RagError::StoreWrite("disk full".to_string());
        assert_eq!(err.kind(), ErrorKind::StoreWriteError);
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&ErrorKind::ExtractionError).unwrap();
        assert_eq!(json, "\"ExtractionError\"");
        assert_eq!(ErrorKind::StoreReadError.to_string(), "StoreReadError");
    }
}
