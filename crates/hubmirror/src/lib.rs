//! hubmirror - incrementally mirror GitHub project metadata into a SQL store.
//!
//! A run walks one owner's repositories and, for each, its commits, contributors,
//! pull requests, issues and comments. Every document is upserted by its natural
//! key, so re-running converges instead of duplicating.
//!
//! - [`fetch`] - rate-limited, authenticated REST requests
//! - [`walk`] - page-number pagination over list endpoints
//! - [`store`] - chunked, idempotent upserts and read queries
//! - [`sync`] - the [`Orchestrator`] tying them together
//!
//! # Features
//!
//! - `sqlite` / `postgres` - database backends
//! - `migrate` - schema migrations and [`connect_and_migrate`]
//!
//! # Example
//!
//! ```ignore
//! use hubmirror::{Fetcher, FetcherConfig, Orchestrator, SyncOptions, connect_and_migrate};
//!
//! let db = connect_and_migrate("sqlite://hubmirror.db?mode=rwc").await?;
//! let fetcher = Fetcher::from_config(FetcherConfig::new(token))?;
//! let report = Orchestrator::new(fetcher, db, SyncOptions::default())
//!     .sync_owner("octocat")
//!     .await?;
//! ```

pub mod db;
pub mod entity;
pub mod fetch;
pub mod http;
#[cfg(feature = "migrate")]
pub mod migration;
pub mod store;
pub mod sync;
pub mod walk;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use fetch::{FetchError, Fetcher, FetcherConfig};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use store::{StoreError, strip_null_values};
pub use sync::{Orchestrator, SyncError, SyncOptions, SyncProgress, SyncReport};
pub use walk::{WalkConfig, WalkResult, walk};
