use std::fmt;

/// Result type for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors surfaced by blob store operations.
#[derive(Debug)]
pub enum BlobError {
    /// No object exists at the given path.
    NotFound { path: String },

    /// The configured storage URL could not be parsed.
    InvalidUrl { url: String, reason: String },

    /// Error from the underlying object store client.
    Store { source: object_store::Error },

    /// Error produced by the data stream being written.
    Source { source: anyhow::Error },
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound { path } => write!(f, "blob not found: {}", path),
            BlobError::InvalidUrl { url, reason } => {
                write!(f, "invalid blob storage url '{}': {}", url, reason)
            }
            BlobError::Store { source } => write!(f, "object store error: {}", source),
            BlobError::Source { source } => write!(f, "blob source stream error: {}", source),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::Store { source } => Some(source),
            BlobError::Source { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<object_store::Error> for BlobError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlobError::NotFound { path },
            err => BlobError::Store { source: err },
        }
    }
}

impl From<anyhow::Error> for BlobError {
    fn from(err: anyhow::Error) -> Self {
        BlobError::Source { source: err }
    }
}
