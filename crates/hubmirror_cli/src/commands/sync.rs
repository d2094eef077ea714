//! `hubmirror sync`: one ingestion pass over an owner.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use hubmirror::{Fetcher, FetcherConfig, Orchestrator, SyncOptions, SyncReport, connect_and_migrate};

use crate::config::{Config, SyncConfig};
use crate::progress::ProgressReporter;
use crate::shutdown::{INTERRUPTED_EXIT_CODE, run_until_interrupted};

/// Flags for `hubmirror sync`. Unset flags fall back to the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct SyncArgs {
    /// User or organization to mirror (default: sync.owner or GITHUB_OWNER)
    pub owner: Option<String>,

    /// Skip issue and pull request comments
    #[arg(long)]
    pub no_comments: bool,

    /// Items requested per page, 1-100 (default from config or 100)
    #[arg(short = 'p', long)]
    pub page_size: Option<u32>,

    /// Repositories synced at once (default from config or 1)
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Fail instead of waiting longer than this many seconds for the rate limit
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Stop at the first repository that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// API root, e.g. for GitHub Enterprise (default: https://api.github.com)
    #[arg(long)]
    pub api_url: Option<String>,
}

impl SyncArgs {
    fn sync_options(&self, config: &SyncConfig) -> SyncOptions {
        SyncOptions {
            include_comments: config.include_comments && !self.no_comments,
            page_size: self.page_size.unwrap_or(config.page_size),
            concurrency: self.concurrency.unwrap_or(config.concurrency).max(1),
            fail_fast: self.fail_fast || config.fail_fast,
        }
    }

    fn fetcher_config(&self, token: String, config: &Config) -> FetcherConfig {
        FetcherConfig::new(token)
            .with_api_url(
                self.api_url
                    .clone()
                    .unwrap_or_else(|| config.github.api_url.clone()),
            )
            .with_requests_per_hour(config.github.requests_per_hour)
            .with_max_wait(
                self.max_wait
                    .map(Duration::from_secs)
                    .or_else(|| config.sync.max_rate_limit_wait()),
            )
    }
}

pub(crate) async fn handle_sync(
    args: SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let owner = config.owner(args.owner.clone())?;
    let token = config.github_token()?;
    let options = args.sync_options(&config.sync);
    let fetcher = Fetcher::from_config(args.fetcher_config(token, config))?;

    let db = connect_and_migrate(database_url).await?;

    tracing::debug!(
        owner = %owner,
        include_comments = options.include_comments,
        page_size = options.page_size,
        concurrency = options.concurrency,
        fail_fast = options.fail_fast,
        "Sync options"
    );

    let reporter = Arc::new(ProgressReporter::new());
    let orchestrator =
        Orchestrator::new(fetcher, db, options).with_progress(reporter.as_callback());

    let Some(result) = run_until_interrupted(orchestrator.sync_owner(&owner)).await else {
        return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
    };

    let report = result?;
    log_totals(&report);
    report.into_result()?;
    Ok(ExitCode::SUCCESS)
}

fn log_totals(report: &SyncReport) {
    let totals = report.totals();
    let elapsed = report.finished_at - report.started_at;
    tracing::info!(
        owner = %report.owner,
        repositories = report.repositories.len(),
        commits = totals.commits,
        contributors = totals.contributors,
        pull_requests = totals.pull_requests,
        issues = totals.issues,
        comments = totals.comments(),
        elapsed_secs = elapsed.num_seconds(),
        "Totals"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_fall_back_to_config() {
        let config = SyncConfig {
            include_comments: true,
            page_size: 40,
            concurrency: 3,
            fail_fast: true,
            ..SyncConfig::default()
        };
        let options = SyncArgs::default().sync_options(&config);

        assert!(options.include_comments);
        assert_eq!(options.page_size, 40);
        assert_eq!(options.concurrency, 3);
        assert!(options.fail_fast);
    }

    #[test]
    fn flags_override_config() {
        let args = SyncArgs {
            no_comments: true,
            page_size: Some(10),
            concurrency: Some(0),
            fail_fast: true,
            ..SyncArgs::default()
        };
        let options = args.sync_options(&SyncConfig::default());

        assert!(!options.include_comments);
        assert_eq!(options.page_size, 10);
        assert_eq!(options.concurrency, 1);
        assert!(options.fail_fast);
    }

    #[test]
    fn max_wait_flag_wins_over_config() {
        let mut config = Config::default();
        config.sync.max_rate_limit_wait_secs = Some(600);

        let from_config = SyncArgs::default().fetcher_config("t".to_string(), &config);
        assert_eq!(from_config.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(from_config.api_url, "https://api.github.com");

        let args = SyncArgs {
            max_wait: Some(5),
            api_url: Some("https://ghe.example.com/api/v3".to_string()),
            ..SyncArgs::default()
        };
        let from_flag = args.fetcher_config("t".to_string(), &config);
        assert_eq!(from_flag.max_wait, Some(Duration::from_secs(5)));
        assert_eq!(from_flag.api_url, "https://ghe.example.com/api/v3");
    }
}
