use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised while writing or reading mirrored documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// An upstream object could not be mapped onto its collection's columns.
    #[error("Invalid {collection} record: {message}")]
    InvalidRecord {
        collection: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn invalid(collection: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            collection,
            message: message.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
