//! Options and result types for a sync run.

use chrono::{DateTime, Utc};

use crate::walk::DEFAULT_PAGE_SIZE;

use super::errors::{Result, SyncError};

/// Default number of repositories processed at once.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Options for ingesting one owner.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Walk issue and pull request comments after their parents are stored.
    pub include_comments: bool,
    /// `per_page` for every walk.
    pub page_size: u32,
    /// Repositories processed in parallel once the listing is stored.
    pub concurrency: usize,
    /// Abort the run at the first failing repository.
    pub fail_fast: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            fail_fast: false,
        }
    }
}

/// A stored repository whose children are still to be walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub id: i64,
    pub owner: String,
    pub name: String,
}

impl RepositoryTarget {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Documents stored for one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub commits: usize,
    pub contributors: usize,
    pub pull_requests: usize,
    pub issues: usize,
    pub issue_comments: usize,
    pub pull_request_comments: usize,
}

impl RepositoryStats {
    pub fn comments(&self) -> usize {
        self.issue_comments + self.pull_request_comments
    }

    fn add(&mut self, other: &Self) {
        self.commits += other.commits;
        self.contributors += other.contributors;
        self.pull_requests += other.pull_requests;
        self.issues += other.issues;
        self.issue_comments += other.issue_comments;
        self.pull_request_comments += other.pull_request_comments;
    }
}

/// How one repository fared.
#[derive(Debug, Clone)]
pub struct RepositoryOutcome {
    pub target: RepositoryTarget,
    pub stats: RepositoryStats,
    /// Set when the repository failed. Its children may be partially stored.
    pub error: Option<String>,
}

impl RepositoryOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a full pass over one owner.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub owner: String,
    /// One entry per repository, in listing order.
    pub repositories: Vec<RepositoryOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize {
        self.repositories.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.repositories.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Sum of documents stored across all repositories.
    pub fn totals(&self) -> RepositoryStats {
        let mut totals = RepositoryStats::default();
        for outcome in &self.repositories {
            totals.add(&outcome.stats);
        }
        totals
    }

    /// Turn a report with failed repositories into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::RepositoriesFailed {
                failed: self.failed(),
                total: self.repositories.len(),
            })
        }
    }
}
