//! `hubmirror summary`: what is stored for an owner.

use hubmirror::store::query::{self, RepositorySummary};

use crate::config::Config;

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct SummaryRow {
    #[tabled(rename = "Repository")]
    pub repository: String,
    #[tabled(rename = "Commits")]
    pub commits: u64,
    #[tabled(rename = "Contributors")]
    pub contributors: u64,
    #[tabled(rename = "Pull Requests")]
    pub pull_requests: u64,
    #[tabled(rename = "Issues")]
    pub issues: u64,
    #[tabled(rename = "Comments")]
    pub comments: u64,
    #[tabled(rename = "Collected At")]
    pub collected_at: String,
}

impl From<RepositorySummary> for SummaryRow {
    fn from(summary: RepositorySummary) -> Self {
        Self {
            repository: summary.full_name,
            commits: summary.commits,
            contributors: summary.contributors,
            pull_requests: summary.pull_requests,
            issues: summary.issues,
            comments: summary.comments,
            collected_at: summary
                .collected_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
        }
    }
}

fn render(rows: Vec<SummaryRow>, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Json => serde_json::to_string_pretty(&rows),
    }
}

pub(crate) async fn handle_summary(
    owner: Option<String>,
    output: OutputFormat,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = config.owner(owner)?;
    let db = hubmirror::connect_and_migrate(database_url).await?;

    let rows: Vec<SummaryRow> = query::owner_summary(&db, &owner)
        .await?
        .into_iter()
        .map(SummaryRow::from)
        .collect();

    if rows.is_empty() && matches!(output, OutputFormat::Table) {
        println!("No repositories stored for {owner}.");
        return Ok(());
    }

    println!("{}", render(rows, output)?);
    Ok(())
}
