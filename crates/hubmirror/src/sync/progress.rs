//! Progress events emitted while ingesting an owner.
//!
//! The library never prints. Frontends subscribe by passing a
//! [`ProgressCallback`] and decide how to render each event.

/// Progress events emitted during a sync run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to list the owner's repositories.
    FetchingRepositories {
        /// The owner being synced.
        owner: String,
    },

    /// One page of some paginated listing arrived.
    FetchedPage {
        /// Human-readable label for the listing, e.g. `octocat/hello/commits`.
        resource: String,
        /// Page number (1-indexed).
        page: u32,
        /// Items on this page.
        count: usize,
        /// Running total for this listing.
        total_so_far: usize,
    },

    /// The repository listing is complete and stored.
    RepositoriesStored {
        owner: String,
        count: usize,
    },

    /// Starting on one repository's children.
    SyncingRepository {
        /// `owner/name`.
        repository: String,
        /// Position in the owner's listing (1-indexed).
        index: usize,
        total: usize,
    },

    /// A batch of documents was upserted.
    Stored {
        repository: String,
        collection: &'static str,
        count: usize,
    },

    /// All child collections of a repository are stored.
    RepositoryComplete {
        repository: String,
    },

    /// A repository failed; the run continues unless fail-fast is set.
    RepositoryFailed {
        repository: String,
        error: String,
    },

    /// Non-fatal condition worth surfacing.
    Warning {
        message: String,
    },

    /// The run finished.
    SyncComplete {
        owner: String,
        succeeded: usize,
        failed: usize,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
