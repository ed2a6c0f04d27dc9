//! Error types for metabridge.

use thiserror::Error;

/// Result type alias using metabridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for metabridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The ontology source was unreachable or returned malformed data for a node.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A node has no resolvable type.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A node cannot be projected consistently (e.g. notations on a collection).
    #[error("Projection inconsistency: {0}")]
    ProjectionInconsistency(String),

    /// Altering a warehouse column to its configured width failed.
    #[error("Schema reconciliation error: {0}")]
    SchemaReconciliation(String),

    /// The delete/insert transaction failed and was rolled back.
    #[error("Load transaction error: {0}")]
    LoadTransaction(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Another import or flush holds one of the requested source scopes.
    #[error("Source busy: {0}")]
    SourceBusy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Staged row batch could not be written or read back.
    #[error("Staging error: {0}")]
    Staging(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts the enclosing import.
    ///
    /// Node validation, projection and column reconciliation problems degrade
    /// to a logged default; everything else propagates to the caller.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Validation(_) | Error::ProjectionInconsistency(_) | Error::SchemaReconciliation(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Fetch(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Staging(e.to_string())
    }
}
