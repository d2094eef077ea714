//! hubmirror CLI - mirror a GitHub owner's project metadata into a database.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::summary::OutputFormat;
use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "hubmirror")]
#[command(version)]
#[command(about = "Incrementally mirror GitHub project metadata into a SQL database")]
#[command(
    long_about = "hubmirror walks every repository of a GitHub user or organization and \
stores its commits, contributors, pull requests, issues and comments. Documents are \
upserted by their natural keys, so re-running a sync refreshes the mirror instead of \
duplicating it."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror an organization:
        $ hubmirror sync rust-lang

    Four repositories at a time, without comments:
        $ hubmirror sync rust-lang -c 4 --no-comments

    Show what is stored:
        $ hubmirror summary rust-lang

    Generate shell completions:
        $ hubmirror completions bash > ~/.local/share/bash-completion/completions/hubmirror

CONFIGURATION
    hubmirror reads configuration from:
      1. ~/.config/hubmirror/config.toml (or $XDG_CONFIG_HOME/hubmirror/config.toml)
      2. ./hubmirror.toml
      3. Environment variables (HUBMIRROR_ prefix, e.g. HUBMIRROR_SYNC__CONCURRENCY)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITHUB_TOKEN      GitHub token (required for sync)
    GITHUB_OWNER      Default owner to sync
    DATABASE_URL      Database connection string (default: ~/.local/state/hubmirror/hubmirror.db)
    RUST_LOG          Log filter (default: hubmirror=info,hubmirror_cli=info)
"#)]
struct Cli {
    /// Database connection string (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror one owner's repositories and their documents
    Sync(SyncArgs),
    /// Show per-repository document counts for an owner
    Summary {
        /// User or organization (default: sync.owner or GITHUB_OWNER)
        owner: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Roll back applied migrations
    Down {
        /// Number of migrations to roll back
        #[arg(default_value_t = 1)]
        steps: u32,
    },
    /// List migrations and whether they are applied
    Status,
    /// Drop every mirrored collection and reapply migrations
    Fresh {
        /// Confirm that all stored documents will be deleted
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    // On a terminal the progress reporter prints its own lines.
    let default_filter = if Term::stderr().is_term() {
        "hubmirror=warn,hubmirror_cli=warn"
    } else {
        "hubmirror=info,hubmirror_cli=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Create the parent directory of a file-backed SQLite database.
fn ensure_sqlite_parent_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = std::path::Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = config::Config::load();
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| config.database_url())
        .ok_or("Could not determine a database URL; set DATABASE_URL")?;
    ensure_sqlite_parent_dir(&database_url)?;

    match cli.command {
        Commands::Sync(args) => {
            return commands::sync::handle_sync(args, &config, &database_url).await;
        }
        Commands::Summary { owner, output } => {
            commands::summary::handle_summary(owner, output, &config, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}
