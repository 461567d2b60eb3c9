// ================================================================
// File: atelier-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// A coupon form failed field validation (admin side).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A coupon with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backing store could not be reached or answered with a server fault.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// True for failures that mean "try again" rather than "this input is wrong".
    pub fn is_storage_unavailable(&self) -> bool {
        match self {
            Error::StorageUnavailable(_) | Error::Http(_) => true,
            Error::Database(e) => !matches!(e, sqlx::Error::RowNotFound | sqlx::Error::ColumnDecode { .. }),
            _ => false,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_are_retryable() {
        assert!(Error::StorageUnavailable("down".into()).is_storage_unavailable());
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_storage_unavailable());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_storage_unavailable());
        assert!(!Error::Validation("bad".into()).is_storage_unavailable());
        assert!(!Error::NotFound("x".into()).is_storage_unavailable());
    }
}
