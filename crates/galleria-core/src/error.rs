//! Error types for galleria.

use thiserror::Error;

/// Result type alias using galleria's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for galleria operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range request parameter (limit, page, sort, searchMode)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The underlying store call failed (connectivity, timeout, query translation)
    #[error("Retrieval failure: {0}")]
    RetrievalFailure(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`].
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidParameter(_) | Error::NotFound(_))
    }

    /// Collapse store-side errors into [`Error::RetrievalFailure`].
    ///
    /// Client errors pass through untouched so they still map to 4xx.
    pub fn into_retrieval_failure(self) -> Self {
        if self.is_client_error() || matches!(self, Error::RetrievalFailure(_)) {
            return self;
        }
        Error::RetrievalFailure(self.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
