//! Owner-level ingestion: walk every collection of every repository and store it.
//!
//! - [`types`] - `SyncOptions`, `SyncReport` and per-repository outcomes
//! - [`progress`] - `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - the [`Orchestrator`]
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
//! println!("{} repositories synced", report.succeeded());
//! ```

pub mod engine;
mod errors;
mod progress;
mod types;

pub use engine::Orchestrator;
pub use errors::{Result, SyncError};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{
    DEFAULT_CONCURRENCY, RepositoryOutcome, RepositoryStats, RepositoryTarget, SyncOptions,
    SyncReport,
};
