//! Error types for the document store

use thiserror::Error;

/// Failures while loading or persisting the application document
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure while reading or writing the JSON document
    #[error("document file error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be serialized or deserialized
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The embedded SQLite mirror failed
    #[error("sqlite mirror error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
