use thiserror::Error;

use crate::fetch::FetchError;
use crate::store::StoreError;

/// Errors that end a sync run, or a single repository within it.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A repository task ended without producing a result, e.g. it panicked.
    #[error("{0}")]
    Task(String),

    /// The run finished but some repositories could not be synced.
    #[error("{failed} of {total} repositories failed to sync")]
    RepositoriesFailed { failed: usize, total: usize },
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
