//! Read-side lookups over the mirrored collections.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entity::{comment, commit, contributor, issue, pull_request, repository};

use super::errors::Result;
use super::records::CommentParent;

// ─── Per-owner and per-repository lookups ────────────────────────────────────

/// An owner's repositories, most recently updated first.
pub async fn repositories_by_owner(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Vec<repository::Model>> {
    Ok(repository::Entity::find()
        .filter(repository::Column::OwnerLogin.eq(owner))
        .order_by_desc(repository::Column::UpdatedAt)
        .order_by_asc(repository::Column::Name)
        .all(db)
        .await?)
}

/// Look up one repository by owner and name.
pub async fn find_repository(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
) -> Result<Option<repository::Model>> {
    Ok(repository::Entity::find()
        .filter(repository::Column::OwnerLogin.eq(owner))
        .filter(repository::Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Commits of a repository, newest author date first.
pub async fn commits_for_repository(
    db: &DatabaseConnection,
    repository_id: i64,
) -> Result<Vec<commit::Model>> {
    Ok(commit::Entity::find()
        .filter(commit::Column::RepositoryId.eq(repository_id))
        .order_by_desc(commit::Column::AuthorDate)
        .all(db)
        .await?)
}

/// Contributors of a repository, biggest contributors first.
pub async fn contributors_for_repository(
    db: &DatabaseConnection,
    repository_id: i64,
) -> Result<Vec<contributor::Model>> {
    Ok(contributor::Entity::find()
        .filter(contributor::Column::RepositoryId.eq(repository_id))
        .order_by_desc(contributor::Column::Contributions)
        .order_by_asc(contributor::Column::Login)
        .all(db)
        .await?)
}

pub async fn pull_requests_for_repository(
    db: &DatabaseConnection,
    repository_id: i64,
) -> Result<Vec<pull_request::Model>> {
    Ok(pull_request::Entity::find()
        .filter(pull_request::Column::RepositoryId.eq(repository_id))
        .order_by_desc(pull_request::Column::CreatedAt)
        .order_by_desc(pull_request::Column::Number)
        .all(db)
        .await?)
}

pub async fn issues_for_repository(
    db: &DatabaseConnection,
    repository_id: i64,
) -> Result<Vec<issue::Model>> {
    Ok(issue::Entity::find()
        .filter(issue::Column::RepositoryId.eq(repository_id))
        .order_by_desc(issue::Column::CreatedAt)
        .order_by_desc(issue::Column::Number)
        .all(db)
        .await?)
}

/// Comments on one issue or pull request, oldest first.
pub async fn comments_for(
    db: &DatabaseConnection,
    repository_id: i64,
    parent: CommentParent,
) -> Result<Vec<comment::Model>> {
    let query = comment::Entity::find().filter(comment::Column::RepositoryId.eq(repository_id));
    let query = match parent {
        CommentParent::Issue(number) => query.filter(comment::Column::IssueId.eq(number)),
        CommentParent::PullRequest(number) => {
            query.filter(comment::Column::PullRequestId.eq(number))
        }
    };
    Ok(query
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await?)
}

// ─── Cross-repository lookups ────────────────────────────────────────────────

/// Latest commits across all of an owner's repositories.
pub async fn recent_commits(
    db: &DatabaseConnection,
    owner: &str,
    limit: u64,
) -> Result<Vec<commit::Model>> {
    Ok(commit::Entity::find()
        .inner_join(repository::Entity)
        .filter(repository::Column::OwnerLogin.eq(owner))
        .order_by_desc(commit::Column::AuthorDate)
        .limit(limit)
        .all(db)
        .await?)
}

/// Most recently opened issues across all of an owner's repositories.
pub async fn recent_issues(
    db: &DatabaseConnection,
    owner: &str,
    limit: u64,
) -> Result<Vec<issue::Model>> {
    Ok(issue::Entity::find()
        .inner_join(repository::Entity)
        .filter(repository::Column::OwnerLogin.eq(owner))
        .order_by_desc(issue::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

/// Most recently opened pull requests across all of an owner's repositories.
pub async fn recent_pull_requests(
    db: &DatabaseConnection,
    owner: &str,
    limit: u64,
) -> Result<Vec<pull_request::Model>> {
    Ok(pull_request::Entity::find()
        .inner_join(repository::Entity)
        .filter(repository::Column::OwnerLogin.eq(owner))
        .order_by_desc(pull_request::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

// ─── Summaries ───────────────────────────────────────────────────────────────

/// Stored document counts for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub repository_id: i64,
    pub full_name: String,
    pub commits: u64,
    pub contributors: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub comments: u64,
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

/// Per-repository document counts for an owner, in [`repositories_by_owner`] order.
pub async fn owner_summary(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Vec<RepositorySummary>> {
    let repositories = repositories_by_owner(db, owner).await?;
    let mut summaries = Vec::with_capacity(repositories.len());

    for repo in repositories {
        let id = repo.id;
        summaries.push(RepositorySummary {
            repository_id: id,
            full_name: repo.full_name,
            commits: commit::Entity::find()
                .filter(commit::Column::RepositoryId.eq(id))
                .count(db)
                .await?,
            contributors: contributor::Entity::find()
                .filter(contributor::Column::RepositoryId.eq(id))
                .count(db)
                .await?,
            pull_requests: pull_request::Entity::find()
                .filter(pull_request::Column::RepositoryId.eq(id))
                .count(db)
                .await?,
            issues: issue::Entity::find()
                .filter(issue::Column::RepositoryId.eq(id))
                .count(db)
                .await?,
            comments: comment::Entity::find()
                .filter(comment::Column::RepositoryId.eq(id))
                .count(db)
                .await?,
            collected_at: repo.collected_at.with_timezone(&chrono::Utc),
        });
    }

    Ok(summaries)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};

    use crate::connect_and_migrate;
    use crate::store::{
        CommentDoc, CommitDoc, ContributorDoc, FromPayload, IssueDoc, PullRequestDoc,
        RepositoryDoc, upsert_many, upsert_many_at, upsert_payloads,
    };

    use super::*;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    fn repo_payload(id: i64, owner: &str, name: &str, updated_at: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "full_name": format!("{owner}/{name}"),
            "owner": {"login": owner},
            "language": "Rust",
            "stargazers_count": id * 10,
            "updated_at": updated_at,
        })
    }

    fn issue_payload(id: i64, number: i64, created_at: &str) -> Value {
        json!({
            "id": id,
            "number": number,
            "state": "open",
            "title": format!("issue {number}"),
            "created_at": created_at,
        })
    }

    #[tokio::test]
    async fn upsert_is_idempotent_apart_from_collected_at() {
        let db = setup_db().await;
        let payloads = vec![
            repo_payload(1, "octocat", "a", "2024-01-01T00:00:00Z"),
            repo_payload(2, "octocat", "b", "2024-02-01T00:00:00Z"),
        ];

        let first_keys = upsert_payloads::<RepositoryDoc>(&db, (), payloads.clone())
            .await
            .expect("first upsert");
        let first = repositories_by_owner(&db, "octocat").await.expect("query");

        let second_keys = upsert_payloads::<RepositoryDoc>(&db, (), payloads)
            .await
            .expect("second upsert");
        let second = repositories_by_owner(&db, "octocat").await.expect("query");

        assert_eq!(first_keys, second_keys);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        for (before, after) in first.iter().zip(&second) {
            assert!(after.collected_at >= before.collected_at);
            let mut after = after.clone();
            after.collected_at = before.collected_at;
            assert_eq!(&after, before);
        }
    }

    #[tokio::test]
    async fn refresh_overwrites_fields() {
        let db = setup_db().await;
        upsert_payloads::<RepositoryDoc>(
            &db,
            (),
            vec![repo_payload(1, "octocat", "old-name", "2024-01-01T00:00:00Z")],
        )
        .await
        .expect("insert");
        upsert_payloads::<RepositoryDoc>(
            &db,
            (),
            vec![repo_payload(1, "octocat", "new-name", "2024-03-01T00:00:00Z")],
        )
        .await
        .expect("refresh");

        let repos = repositories_by_owner(&db, "octocat").await.expect("query");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "new-name");
    }

    #[tokio::test]
    async fn older_collected_at_never_rolls_back_a_row() {
        let db = setup_db().await;
        let newer = Utc::now().fixed_offset();
        let older = newer - Duration::hours(1);

        let doc = |name: &str| {
            RepositoryDoc::from_payload((), repo_payload(1, "octocat", name, "2024-01-01T00:00:00Z"))
                .expect("valid")
                .expect("kept")
        };

        upsert_many_at(&db, vec![doc("fresh")], newer)
            .await
            .expect("newer write");
        upsert_many_at(&db, vec![doc("stale")], older)
            .await
            .expect("older write is a no-op, not an error");

        let stored = find_repository(&db, "octocat", "fresh")
            .await
            .expect("query")
            .expect("row kept its newer content");
        assert_eq!(stored.collected_at, newer);
        assert!(
            find_repository(&db, "octocat", "stale")
                .await
                .expect("query")
                .is_none()
        );
    }

    #[tokio::test]
    async fn issues_exclude_pull_requests_and_thread_repository_id() {
        let db = setup_db().await;
        let mut pr_shaped = issue_payload(10, 1, "2024-01-01T00:00:00Z");
        pr_shaped["pull_request"] = json!({"url": "https://api.github.com/repos/o/r/pulls/1"});

        let keys = upsert_payloads::<IssueDoc>(
            &db,
            42,
            vec![pr_shaped, issue_payload(11, 2, "2024-01-02T00:00:00Z")],
        )
        .await
        .expect("upsert");
        assert_eq!(keys, vec![2]);

        let issues = issues_for_repository(&db, 42).await.expect("query");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 2);
        assert_eq!(issues[0].repository_id, 42);
    }

    #[tokio::test]
    async fn comments_are_filtered_by_parent_kind() {
        let db = setup_db().await;
        upsert_payloads::<CommentDoc>(
            &db,
            (42, CommentParent::Issue(2)),
            vec![
                json!({"id": 100, "body": "first", "created_at": "2024-01-01T00:00:00Z"}),
                json!({"id": 101, "body": "second", "created_at": "2024-01-02T00:00:00Z"}),
            ],
        )
        .await
        .expect("issue comments");
        upsert_payloads::<CommentDoc>(
            &db,
            (42, CommentParent::PullRequest(2)),
            vec![json!({"id": 200, "body": "review"})],
        )
        .await
        .expect("review comments");

        let on_issue = comments_for(&db, 42, CommentParent::Issue(2))
            .await
            .expect("query");
        assert_eq!(
            on_issue.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![100, 101]
        );
        assert!(on_issue.iter().all(|c| c.pull_request_id.is_none()));

        let on_pr = comments_for(&db, 42, CommentParent::PullRequest(2))
            .await
            .expect("query");
        assert_eq!(on_pr.len(), 1);
        assert_eq!(on_pr[0].issue_id, None);
    }

    #[tokio::test]
    async fn recent_queries_are_scoped_to_owner() {
        let db = setup_db().await;
        upsert_payloads::<RepositoryDoc>(
            &db,
            (),
            vec![
                repo_payload(1, "octocat", "a", "2024-01-01T00:00:00Z"),
                repo_payload(2, "someone-else", "b", "2024-01-01T00:00:00Z"),
            ],
        )
        .await
        .expect("repos");
        upsert_payloads::<IssueDoc>(
            &db,
            1,
            vec![
                issue_payload(11, 1, "2024-01-01T00:00:00Z"),
                issue_payload(12, 2, "2024-02-01T00:00:00Z"),
            ],
        )
        .await
        .expect("octocat issues");
        upsert_payloads::<IssueDoc>(&db, 2, vec![issue_payload(21, 1, "2024-03-01T00:00:00Z")])
            .await
            .expect("other issues");
        upsert_payloads::<CommitDoc>(
            &db,
            1,
            vec![json!({"sha": "abc", "commit": {"message": "m", "author": {"name": "Mona", "date": "2024-01-05T00:00:00Z"}}})],
        )
        .await
        .expect("commits");
        upsert_payloads::<PullRequestDoc>(
            &db,
            2,
            vec![json!({"id": 31, "number": 3, "state": "open", "title": "x"})],
        )
        .await
        .expect("other pulls");

        let issues = recent_issues(&db, "octocat", 10).await.expect("query");
        assert_eq!(issues.iter().map(|i| i.id).collect::<Vec<_>>(), vec![12, 11]);

        let limited = recent_issues(&db, "octocat", 1).await.expect("query");
        assert_eq!(limited.len(), 1);

        let commits = recent_commits(&db, "octocat", 10).await.expect("query");
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].author_name.as_deref(), Some("Mona"));

        let pulls = recent_pull_requests(&db, "octocat", 10).await.expect("query");
        assert!(pulls.is_empty());
    }

    #[tokio::test]
    async fn owner_summary_counts_each_collection() {
        let db = setup_db().await;
        upsert_payloads::<RepositoryDoc>(
            &db,
            (),
            vec![repo_payload(1, "octocat", "a", "2024-01-01T00:00:00Z")],
        )
        .await
        .expect("repos");
        upsert_many(
            &db,
            vec![ContributorDoc {
                repository_id: 1,
                login: "mona".to_string(),
                contributions: 3,
                payload: json!({"login": "mona"}),
            }],
        )
        .await
        .expect("contributors");
        upsert_payloads::<IssueDoc>(&db, 1, vec![issue_payload(11, 1, "2024-01-01T00:00:00Z")])
            .await
            .expect("issues");

        let summary = owner_summary(&db, "octocat").await.expect("summary");
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].full_name, "octocat/a");
        assert_eq!(summary[0].contributors, 1);
        assert_eq!(summary[0].issues, 1);
        assert_eq!(summary[0].commits, 0);
        assert_eq!(summary[0].comments, 0);

        assert!(owner_summary(&db, "nobody").await.expect("summary").is_empty());
    }
}
