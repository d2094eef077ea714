use hubmirror::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchingRepositories { owner } => {
                tracing::info!(owner = %owner, "Fetching repositories");
            }

            SyncProgress::FetchedPage {
                resource,
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(resource = %resource, page, count, total_so_far, "Fetched page");
            }

            SyncProgress::RepositoriesStored { owner, count } => {
                tracing::info!(owner = %owner, count, "Repositories stored");
            }

            SyncProgress::SyncingRepository {
                repository,
                index,
                total,
            } => {
                tracing::info!(repo = %repository, index, total, "Syncing repository");
            }

            SyncProgress::Stored {
                repository,
                collection,
                count,
            } => {
                tracing::debug!(repo = %repository, collection, count, "Stored documents");
            }

            SyncProgress::RepositoryComplete { repository } => {
                tracing::debug!(repo = %repository, "Repository complete");
            }

            SyncProgress::RepositoryFailed { repository, error } => {
                tracing::error!(repo = %repository, error = %error, "Repository failed");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            SyncProgress::SyncComplete {
                owner,
                succeeded,
                failed,
            } => {
                tracing::info!(owner = %owner, succeeded, failed, "Sync complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
