//! Idempotent persistence of mirrored documents.
//!
//! Every write is an upsert keyed by the collection's natural key, stamped with a
//! `collected_at` time that never moves backwards. Nothing here deletes rows.

mod document;
mod errors;
pub mod query;
mod records;
mod upsert;

pub use document::{Document, FromPayload, strip_null_values};
pub use errors::{Result, StoreError};
pub use records::{
    CommentDoc, CommentParent, CommitDoc, ContributorDoc, IssueDoc, PullRequestDoc,
    RepositoryDoc, is_pull_request,
};
pub use upsert::{
    DEFAULT_UPSERT_RETRIES, UPSERT_CHUNK_SIZE, upsert_many, upsert_many_at, upsert_payloads,
};
