//! The ingestion pass for one owner.
//!
//! 1. Walk and store the owner's repositories.
//! 2. Per repository: commits, contributors, pull requests, issues.
//! 3. Per stored issue / pull request: its comments, tagged with the parent number.
//!
//! Repositories are independent once the listing is stored, so step 2-3 runs for up
//! to `concurrency` repositories at a time. A failing repository is recorded in the
//! report and the run moves on, unless `fail_fast` is set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel};
use tokio::task::JoinSet;

use crate::fetch::Fetcher;
use crate::store::{
    CommentDoc, CommentParent, CommitDoc, ContributorDoc, FromPayload, IssueDoc, PullRequestDoc,
    RepositoryDoc, upsert_many, upsert_payloads,
};
use crate::walk::{WalkConfig, walk};

use super::errors::{Result, SyncError};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{RepositoryOutcome, RepositoryStats, RepositoryTarget, SyncOptions, SyncReport};

/// Drives fetch → store for one owner at a time.
///
/// Cheap to clone: the fetcher shares its quota and the connection is shared.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Fetcher,
    db: Arc<DatabaseConnection>,
    options: SyncOptions,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Fetcher,
        db: impl Into<Arc<DatabaseConnection>>,
        options: SyncOptions,
    ) -> Self {
        Self {
            fetcher,
            db: db.into(),
            options,
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_deref()
    }

    /// Run one full synchronization pass for `owner`.
    ///
    /// # Errors
    /// Fails if the repository listing cannot be walked or stored, or, with
    /// `fail_fast`, with the first repository's error. Otherwise per-repository
    /// failures are reported in [`SyncReport::repositories`].
    pub async fn sync_owner(&self, owner: &str) -> Result<SyncReport> {
        let started_at = Utc::now();
        tracing::info!(owner, "Starting sync");

        let targets = self.sync_repositories(owner).await?;
        let repositories = self.sync_targets(targets).await?;

        let report = SyncReport {
            owner: owner.to_string(),
            repositories,
            started_at,
            finished_at: Utc::now(),
        };

        emit(
            self.progress(),
            SyncProgress::SyncComplete {
                owner: owner.to_string(),
                succeeded: report.succeeded(),
                failed: report.failed(),
            },
        );
        tracing::info!(
            owner,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Sync finished"
        );

        Ok(report)
    }

    /// Walk and store an owner's repositories, returning them in listing order.
    pub async fn sync_repositories(&self, owner: &str) -> Result<Vec<RepositoryTarget>> {
        emit(
            self.progress(),
            SyncProgress::FetchingRepositories {
                owner: owner.to_string(),
            },
        );

        let config = WalkConfig::repositories(owner).with_page_size(self.options.page_size);
        let walked = walk(&self.fetcher, &config, self.progress()).await?;

        let mut docs = Vec::with_capacity(walked.items.len());
        for payload in walked.items {
            if let Some(doc) = RepositoryDoc::from_payload((), payload)? {
                docs.push(doc);
            }
        }

        let mut seen = HashSet::with_capacity(docs.len());
        let targets: Vec<RepositoryTarget> = docs
            .iter()
            .filter(|doc| seen.insert(doc.id))
            .map(|doc| RepositoryTarget {
                id: doc.id,
                owner: doc.owner_login.clone(),
                name: doc.name.clone(),
            })
            .collect();

        upsert_many(&self.db, docs).await?;

        emit(
            self.progress(),
            SyncProgress::RepositoriesStored {
                owner: owner.to_string(),
                count: targets.len(),
            },
        );
        tracing::info!(owner, count = targets.len(), "Stored repositories");

        Ok(targets)
    }

    async fn sync_targets(&self, targets: Vec<RepositoryTarget>) -> Result<Vec<RepositoryOutcome>> {
        let total = targets.len();
        let concurrency = self.options.concurrency.max(1);
        let mut slots: Vec<Option<RepositoryOutcome>> = (0..total).map(|_| None).collect();
        let mut task_index: HashMap<tokio::task::Id, usize> = HashMap::new();
        let mut join_set: JoinSet<(usize, Result<RepositoryStats>)> = JoinSet::new();
        let mut pending = targets.iter().cloned().enumerate();
        let mut unattributed: Vec<String> = Vec::new();

        loop {
            while join_set.len() < concurrency {
                let Some((index, target)) = pending.next() else {
                    break;
                };
                let orchestrator = self.clone();
                let handle = join_set.spawn(async move {
                    emit(
                        orchestrator.progress(),
                        SyncProgress::SyncingRepository {
                            repository: target.full_name(),
                            index: index + 1,
                            total,
                        },
                    );
                    (index, orchestrator.sync_repository(&target).await)
                });
                task_index.insert(handle.id(), index);
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            let (index, result) = match joined {
                Ok((index, result)) => (index, result.map_err(|e| (e.to_string(), Some(e)))),
                Err(join_err) => {
                    let message = format!("sync task failed: {join_err}");
                    match task_index.get(&join_err.id()) {
                        Some(&index) => (index, Err((message, None))),
                        None => {
                            tracing::error!(error = %message, "Untracked sync task failed");
                            if self.options.fail_fast {
                                join_set.abort_all();
                                return Err(SyncError::Task(message));
                            }
                            unattributed.push(message);
                            continue;
                        }
                    }
                }
            };

            let target = targets[index].clone();
            match result {
                Ok(stats) => {
                    slots[index] = Some(RepositoryOutcome {
                        target,
                        stats,
                        error: None,
                    });
                }
                Err((message, source)) => {
                    tracing::error!(
                        repository = %target.full_name(),
                        error = %message,
                        "Repository sync failed"
                    );
                    emit(
                        self.progress(),
                        SyncProgress::RepositoryFailed {
                            repository: target.full_name(),
                            error: message.clone(),
                        },
                    );

                    if self.options.fail_fast {
                        join_set.abort_all();
                        return Err(source.unwrap_or(SyncError::Task(message)));
                    }

                    slots[index] = Some(RepositoryOutcome {
                        target,
                        stats: RepositoryStats::default(),
                        error: Some(message),
                    });
                }
            }
        }

        // A repository without an outcome lost its task to a failure that could
        // not be attributed by task id.
        let fallback = unattributed
            .first()
            .cloned()
            .unwrap_or_else(|| "sync task finished without an outcome".to_string());
        Ok(slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| RepositoryOutcome {
                    target,
                    stats: RepositoryStats::default(),
                    error: Some(fallback.clone()),
                })
            })
            .collect())
    }

    /// Walk and store every child collection of one repository.
    pub async fn sync_repository(&self, target: &RepositoryTarget) -> Result<RepositoryStats> {
        let (owner, name, id) = (target.owner.as_str(), target.name.as_str(), target.id);
        let repository = target.full_name();
        let mut stats = RepositoryStats::default();

        stats.commits = self
            .walk_and_store::<CommitDoc>(WalkConfig::commits(owner, name), id, &repository)
            .await?
            .len();
        stats.contributors = self
            .walk_and_store::<ContributorDoc>(WalkConfig::contributors(owner, name), id, &repository)
            .await?
            .len();

        let pull_request_numbers = self
            .walk_and_store::<PullRequestDoc>(WalkConfig::pull_requests(owner, name), id, &repository)
            .await?;
        stats.pull_requests = pull_request_numbers.len();

        let issue_numbers = self
            .walk_and_store::<IssueDoc>(WalkConfig::issues(owner, name), id, &repository)
            .await?;
        stats.issues = issue_numbers.len();

        if self.options.include_comments {
            for number in issue_numbers {
                stats.issue_comments += self
                    .walk_and_store::<CommentDoc>(
                        WalkConfig::issue_comments(owner, name, number),
                        (id, CommentParent::Issue(number)),
                        &repository,
                    )
                    .await?
                    .len();
            }
            for number in pull_request_numbers {
                stats.pull_request_comments += self
                    .walk_and_store::<CommentDoc>(
                        WalkConfig::pull_request_comments(owner, name, number),
                        (id, CommentParent::PullRequest(number)),
                        &repository,
                    )
                    .await?
                    .len();
            }
        }

        emit(
            self.progress(),
            SyncProgress::RepositoryComplete {
                repository: repository.clone(),
            },
        );
        tracing::info!(
            repository = %repository,
            commits = stats.commits,
            contributors = stats.contributors,
            pull_requests = stats.pull_requests,
            issues = stats.issues,
            comments = stats.comments(),
            "Repository synced"
        );

        Ok(stats)
    }

    async fn walk_and_store<D>(
        &self,
        config: WalkConfig,
        context: D::Context,
        repository: &str,
    ) -> Result<Vec<D::Key>>
    where
        D: FromPayload,
        <D::Entity as EntityTrait>::Model: IntoActiveModel<D::ActiveModel>,
    {
        let config = config.with_page_size(self.options.page_size);
        let walked = walk(&self.fetcher, &config, self.progress()).await?;
        let keys = upsert_payloads::<D>(&self.db, context, walked.items).await?;

        if !keys.is_empty() {
            emit(
                self.progress(),
                SyncProgress::Stored {
                    repository: repository.to_string(),
                    collection: D::COLLECTION,
                    count: keys.len(),
                },
            );
        }
        tracing::debug!(
            repository,
            collection = D::COLLECTION,
            count = keys.len(),
            "Stored documents"
        );

        Ok(keys)
    }
}
