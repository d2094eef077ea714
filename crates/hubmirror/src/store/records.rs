//! Typed documents for the six mirrored collections.
//!
//! Each document keeps the columns the analytics consumer filters and sorts on,
//! plus the full upstream object (nulls stripped) as `payload`.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use serde::Deserialize;
use serde_json::Value;

use crate::entity::{comment, commit, contributor, issue, pull_request, repository};

use super::document::{Document, FromPayload, collected_at_guard, parse, strip_null_values};
use super::errors::Result;

fn db_time(value: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    value.map(|t| t.fixed_offset())
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

// ─── Repositories ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryDoc {
    pub id: i64,
    pub owner_login: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: i64,
    pub forks_count: i64,
    pub watchers_count: i64,
    pub open_issues_count: i64,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub pushed_at: Option<DateTimeWithTimeZone>,
    pub payload: Value,
}

#[derive(Deserialize)]
struct RepositoryFields {
    id: i64,
    name: String,
    full_name: Option<String>,
    owner: Account,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: i64,
    #[serde(default)]
    forks_count: i64,
    #[serde(default)]
    watchers_count: i64,
    #[serde(default)]
    open_issues_count: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
}

impl Document for RepositoryDoc {
    type Entity = repository::Entity;
    type ActiveModel = repository::ActiveModel;
    type Key = i64;

    const COLLECTION: &'static str = "repositories";

    fn key(&self) -> i64 {
        self.id
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> repository::ActiveModel {
        repository::ActiveModel {
            id: Set(self.id),
            owner_login: Set(self.owner_login),
            name: Set(self.name),
            full_name: Set(self.full_name),
            description: Set(self.description),
            language: Set(self.language),
            stargazers_count: Set(self.stargazers_count),
            forks_count: Set(self.forks_count),
            watchers_count: Set(self.watchers_count),
            open_issues_count: Set(self.open_issues_count),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
            pushed_at: Set(self.pushed_at),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use repository::Column;
        OnConflict::column(Column::Id)
            .update_columns([
                Column::OwnerLogin,
                Column::Name,
                Column::FullName,
                Column::Description,
                Column::Language,
                Column::StargazersCount,
                Column::ForksCount,
                Column::WatchersCount,
                Column::OpenIssuesCount,
                Column::CreatedAt,
                Column::UpdatedAt,
                Column::PushedAt,
                Column::Payload,
                Column::CollectedAt,
            ])
            .action_and_where(collected_at_guard::<repository::Entity>(
                Column::CollectedAt,
            ))
            .to_owned()
    }
}

impl FromPayload for RepositoryDoc {
    type Context = ();

    fn from_payload(_: (), payload: Value) -> Result<Option<Self>> {
        let payload = strip_null_values(payload);
        let fields: RepositoryFields = parse(Self::COLLECTION, &payload)?;
        let full_name = fields
            .full_name
            .unwrap_or_else(|| format!("{}/{}", fields.owner.login, fields.name));

        Ok(Some(Self {
            id: fields.id,
            owner_login: fields.owner.login,
            name: fields.name,
            full_name,
            description: fields.description,
            language: fields.language,
            stargazers_count: fields.stargazers_count,
            forks_count: fields.forks_count,
            watchers_count: fields.watchers_count,
            open_issues_count: fields.open_issues_count,
            created_at: db_time(fields.created_at),
            updated_at: db_time(fields.updated_at),
            pushed_at: db_time(fields.pushed_at),
            payload,
        }))
    }
}

// ─── Commits ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CommitDoc {
    pub repository_id: i64,
    pub sha: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_date: Option<DateTimeWithTimeZone>,
    pub message: String,
    pub payload: Value,
}

#[derive(Deserialize)]
struct CommitFields {
    sha: String,
    commit: GitCommit,
}

#[derive(Deserialize)]
struct GitCommit {
    author: Option<GitSignature>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct GitSignature {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl Document for CommitDoc {
    type Entity = commit::Entity;
    type ActiveModel = commit::ActiveModel;
    type Key = (i64, String);

    const COLLECTION: &'static str = "commits";

    fn key(&self) -> (i64, String) {
        (self.repository_id, self.sha.clone())
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> commit::ActiveModel {
        commit::ActiveModel {
            repository_id: Set(self.repository_id),
            sha: Set(self.sha),
            author_name: Set(self.author_name),
            author_email: Set(self.author_email),
            author_date: Set(self.author_date),
            message: Set(self.message),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use commit::Column;
        OnConflict::columns([Column::RepositoryId, Column::Sha])
            .update_columns([
                Column::AuthorName,
                Column::AuthorEmail,
                Column::AuthorDate,
                Column::Message,
                Column::Payload,
                Column::CollectedAt,
            ])
            .action_and_where(collected_at_guard::<commit::Entity>(Column::CollectedAt))
            .to_owned()
    }
}

impl FromPayload for CommitDoc {
    /// Owning repository id.
    type Context = i64;

    fn from_payload(repository_id: i64, payload: Value) -> Result<Option<Self>> {
        let payload = strip_null_values(payload);
        let fields: CommitFields = parse(Self::COLLECTION, &payload)?;
        let (author_name, author_email, author_date) = match fields.commit.author {
            Some(author) => (author.name, author.email, db_time(author.date)),
            None => (None, None, None),
        };

        Ok(Some(Self {
            repository_id,
            sha: fields.sha,
            author_name,
            author_email,
            author_date,
            message: fields.commit.message,
            payload,
        }))
    }
}

// ─── Contributors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ContributorDoc {
    pub repository_id: i64,
    pub login: String,
    pub contributions: i64,
    pub payload: Value,
}

#[derive(Deserialize)]
struct ContributorFields {
    login: String,
    #[serde(default)]
    contributions: i64,
}

impl Document for ContributorDoc {
    type Entity = contributor::Entity;
    type ActiveModel = contributor::ActiveModel;
    type Key = (i64, String);

    const COLLECTION: &'static str = "contributors";

    fn key(&self) -> (i64, String) {
        (self.repository_id, self.login.clone())
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> contributor::ActiveModel {
        contributor::ActiveModel {
            repository_id: Set(self.repository_id),
            login: Set(self.login),
            contributions: Set(self.contributions),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use contributor::Column;
        OnConflict::columns([Column::RepositoryId, Column::Login])
            .update_columns([Column::Contributions, Column::Payload, Column::CollectedAt])
            .action_and_where(collected_at_guard::<contributor::Entity>(
                Column::CollectedAt,
            ))
            .to_owned()
    }
}

impl FromPayload for ContributorDoc {
    type Context = i64;

    fn from_payload(repository_id: i64, payload: Value) -> Result<Option<Self>> {
        let payload = strip_null_values(payload);
        let fields: ContributorFields = parse(Self::COLLECTION, &payload)?;
        Ok(Some(Self {
            repository_id,
            login: fields.login,
            contributions: fields.contributions,
            payload,
        }))
    }
}

// ─── Pull requests ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestDoc {
    pub id: i64,
    pub repository_id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub merged_at: Option<DateTimeWithTimeZone>,
    pub payload: Value,
}

#[derive(Deserialize)]
struct PullRequestFields {
    id: i64,
    number: i64,
    state: String,
    #[serde(default)]
    title: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
}

impl Document for PullRequestDoc {
    type Entity = pull_request::Entity;
    type ActiveModel = pull_request::ActiveModel;
    /// Comment listings are addressed by number, so that is what callers get back.
    type Key = i64;

    const COLLECTION: &'static str = "pull_requests";

    fn key(&self) -> i64 {
        self.number
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> pull_request::ActiveModel {
        pull_request::ActiveModel {
            id: Set(self.id),
            repository_id: Set(self.repository_id),
            number: Set(self.number),
            state: Set(self.state),
            title: Set(self.title),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
            closed_at: Set(self.closed_at),
            merged_at: Set(self.merged_at),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use pull_request::Column;
        OnConflict::column(Column::Id)
            .update_columns([
                Column::RepositoryId,
                Column::Number,
                Column::State,
                Column::Title,
                Column::CreatedAt,
                Column::UpdatedAt,
                Column::ClosedAt,
                Column::MergedAt,
                Column::Payload,
                Column::CollectedAt,
            ])
            .action_and_where(collected_at_guard::<pull_request::Entity>(
                Column::CollectedAt,
            ))
            .to_owned()
    }
}

impl FromPayload for PullRequestDoc {
    type Context = i64;

    fn from_payload(repository_id: i64, payload: Value) -> Result<Option<Self>> {
        let payload = strip_null_values(payload);
        let fields: PullRequestFields = parse(Self::COLLECTION, &payload)?;
        Ok(Some(Self {
            id: fields.id,
            repository_id,
            number: fields.number,
            state: fields.state,
            title: fields.title,
            created_at: db_time(fields.created_at),
            updated_at: db_time(fields.updated_at),
            closed_at: db_time(fields.closed_at),
            merged_at: db_time(fields.merged_at),
            payload,
        }))
    }
}

// ─── Issues ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct IssueDoc {
    pub id: i64,
    pub repository_id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub payload: Value,
}

#[derive(Deserialize)]
struct IssueFields {
    id: i64,
    number: i64,
    state: String,
    #[serde(default)]
    title: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
}

/// Whether an issue-listing entry is really a pull request.
pub fn is_pull_request(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|fields| fields.contains_key("pull_request"))
}

impl Document for IssueDoc {
    type Entity = issue::Entity;
    type ActiveModel = issue::ActiveModel;
    type Key = i64;

    const COLLECTION: &'static str = "issues";

    fn key(&self) -> i64 {
        self.number
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> issue::ActiveModel {
        issue::ActiveModel {
            id: Set(self.id),
            repository_id: Set(self.repository_id),
            number: Set(self.number),
            state: Set(self.state),
            title: Set(self.title),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
            closed_at: Set(self.closed_at),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use issue::Column;
        OnConflict::column(Column::Id)
            .update_columns([
                Column::RepositoryId,
                Column::Number,
                Column::State,
                Column::Title,
                Column::CreatedAt,
                Column::UpdatedAt,
                Column::ClosedAt,
                Column::Payload,
                Column::CollectedAt,
            ])
            .action_and_where(collected_at_guard::<issue::Entity>(Column::CollectedAt))
            .to_owned()
    }
}

impl FromPayload for IssueDoc {
    type Context = i64;

    fn from_payload(repository_id: i64, payload: Value) -> Result<Option<Self>> {
        if is_pull_request(&payload) {
            return Ok(None);
        }
        let payload = strip_null_values(payload);
        let fields: IssueFields = parse(Self::COLLECTION, &payload)?;
        Ok(Some(Self {
            id: fields.id,
            repository_id,
            number: fields.number,
            state: fields.state,
            title: fields.title,
            created_at: db_time(fields.created_at),
            updated_at: db_time(fields.updated_at),
            closed_at: db_time(fields.closed_at),
            payload,
        }))
    }
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// The issue or pull request a comment hangs off, by per-repository number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentParent {
    Issue(i64),
    PullRequest(i64),
}

impl CommentParent {
    pub fn number(self) -> i64 {
        match self {
            Self::Issue(n) | Self::PullRequest(n) => n,
        }
    }

    pub fn issue_id(self) -> Option<i64> {
        match self {
            Self::Issue(n) => Some(n),
            Self::PullRequest(_) => None,
        }
    }

    pub fn pull_request_id(self) -> Option<i64> {
        match self {
            Self::PullRequest(n) => Some(n),
            Self::Issue(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentDoc {
    pub id: i64,
    pub repository_id: i64,
    pub parent: CommentParent,
    pub author_login: Option<String>,
    pub body: String,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub payload: Value,
}

#[derive(Deserialize)]
struct CommentFields {
    id: i64,
    user: Option<Account>,
    #[serde(default)]
    body: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Document for CommentDoc {
    type Entity = comment::Entity;
    type ActiveModel = comment::ActiveModel;
    type Key = i64;

    const COLLECTION: &'static str = "comments";

    fn key(&self) -> i64 {
        self.id
    }

    fn into_active_model(self, collected_at: DateTimeWithTimeZone) -> comment::ActiveModel {
        comment::ActiveModel {
            id: Set(self.id),
            repository_id: Set(self.repository_id),
            issue_id: Set(self.parent.issue_id()),
            pull_request_id: Set(self.parent.pull_request_id()),
            author_login: Set(self.author_login),
            body: Set(self.body),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
            payload: Set(self.payload),
            collected_at: Set(collected_at),
        }
    }

    fn on_conflict() -> OnConflict {
        use comment::Column;
        OnConflict::column(Column::Id)
            .update_columns([
                Column::RepositoryId,
                Column::IssueId,
                Column::PullRequestId,
                Column::AuthorLogin,
                Column::Body,
                Column::CreatedAt,
                Column::UpdatedAt,
                Column::Payload,
                Column::CollectedAt,
            ])
            .action_and_where(collected_at_guard::<comment::Entity>(Column::CollectedAt))
            .to_owned()
    }
}

impl FromPayload for CommentDoc {
    type Context = (i64, CommentParent);

    fn from_payload(
        (repository_id, parent): (i64, CommentParent),
        payload: Value,
    ) -> Result<Option<Self>> {
        let payload = strip_null_values(payload);
        let fields: CommentFields = parse(Self::COLLECTION, &payload)?;
        Ok(Some(Self {
            id: fields.id,
            repository_id,
            parent,
            author_login: fields.user.map(|u| u.login),
            body: fields.body,
            created_at: db_time(fields.created_at),
            updated_at: db_time(fields.updated_at),
            payload,
        }))
    }
}
