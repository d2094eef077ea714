//! Configuration file support for hubmirror.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Plain `GITHUB_TOKEN`, `GITHUB_OWNER` and `DATABASE_URL` variables
//! 3. Environment variables prefixed with `HUBMIRROR_`, using `__` between
//!    section and key (e.g. `HUBMIRROR_GITHUB__TOKEN`, `HUBMIRROR_SYNC__PAGE_SIZE`)
//! 4. Config file (./hubmirror.toml, then ~/.config/hubmirror/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "postgres://localhost/hubmirror"  # default: sqlite in the XDG state dir
//!
//! [github]
//! token = "ghp_..."
//! api_url = "https://api.github.com"
//! requests_per_hour = 5000
//!
//! [sync]
//! owner = "octocat"
//! include_comments = true
//! page_size = 100
//! concurrency = 1
//! max_rate_limit_wait_secs = 3600  # omit to wait for any reset
//! fail_fast = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use hubmirror::fetch::{DEFAULT_API_URL, DEFAULT_REQUESTS_PER_HOUR};
use hubmirror::walk::DEFAULT_PAGE_SIZE;
use serde::Deserialize;

const APP_NAME: &str = "hubmirror";

/// Plain variables honoured for compatibility, and the keys they set.
const LEGACY_VARIABLES: [(&str, &str); 3] = [
    ("GITHUB_TOKEN", "github.token"),
    ("GITHUB_OWNER", "sync.owner"),
    ("DATABASE_URL", "database.url"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Upstream API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    /// Quota assumed until the first response reports the real one.
    pub requests_per_hour: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            requests_per_hour: DEFAULT_REQUESTS_PER_HOUR,
        }
    }
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub owner: Option<String>,
    pub include_comments: bool,
    pub page_size: u32,
    pub concurrency: usize,
    /// Longest rate-limit wait before a fetch gives up. Unset waits for any reset.
    pub max_rate_limit_wait_secs: Option<u64>,
    pub fail_fast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner: None,
            include_comments: true,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: 1,
            max_rate_limit_wait_secs: None,
            fail_fast: false,
        }
    }
}

impl SyncConfig {
    pub fn max_rate_limit_wait(&self) -> Option<Duration> {
        self.max_rate_limit_wait_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from files and the environment.
    ///
    /// A config that fails to parse is reported and replaced by the defaults.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("hubmirror.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./hubmirror.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("HUBMIRROR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded = with_legacy_variables(builder, |name| std::env::var(name).ok())
            .and_then(|builder| builder.build())
            .and_then(|settings| settings.try_deserialize::<Config>());

        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    /// The configured database URL, or a SQLite file in the state directory.
    ///
    /// `mode=rwc` creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("hubmirror.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// The API token, required before any network or database work.
    pub fn github_token(&self) -> Result<String, String> {
        self.github
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                "No GitHub token configured. Set GITHUB_TOKEN, HUBMIRROR_GITHUB__TOKEN \
                 or github.token in the config file."
                    .to_string()
            })
    }

    /// Resolve the owner from a CLI argument, falling back to `sync.owner`.
    pub fn owner(&self, cli_owner: Option<String>) -> Result<String, String> {
        cli_owner
            .or_else(|| self.sync.owner.clone())
            .filter(|owner| !owner.trim().is_empty())
            .ok_or_else(|| {
                "No owner given. Pass one on the command line or set GITHUB_OWNER.".to_string()
            })
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// On Linux, `$XDG_STATE_HOME/hubmirror`; elsewhere the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

/// Apply the plain variables on top of everything loaded so far.
fn with_legacy_variables(
    mut builder: Builder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Builder<DefaultState>, ConfigError> {
    for (variable, key) in LEGACY_VARIABLES {
        builder = builder.set_override_option(key, lookup(variable))?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_toml(toml_content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.requests_per_hour, 5000);
        assert!(config.sync.owner.is_none());
        assert!(config.sync.include_comments);
        assert_eq!(config.sync.page_size, 100);
        assert_eq!(config.sync.concurrency, 1);
        assert!(config.sync.max_rate_limit_wait().is_none());
        assert!(!config.sync.fail_fast);
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/hubmirror"

            [github]
            token = "ghp_test123"
            api_url = "https://ghe.example.com/api/v3"
            requests_per_hour = 15000

            [sync]
            owner = "octocat"
            include_comments = false
            page_size = 50
            concurrency = 4
            max_rate_limit_wait_secs = 600
            fail_fast = true
        "#,
        );

        assert_eq!(
            config.database_url(),
            Some("postgres://localhost/hubmirror".to_string())
        );
        assert_eq!(config.github_token(), Ok("ghp_test123".to_string()));
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.requests_per_hour, 15000);
        assert_eq!(config.sync.owner.as_deref(), Some("octocat"));
        assert!(!config.sync.include_comments);
        assert_eq!(config.sync.page_size, 50);
        assert_eq!(config.sync.concurrency, 4);
        assert_eq!(
            config.sync.max_rate_limit_wait(),
            Some(Duration::from_secs(600))
        );
        assert!(config.sync.fail_fast);
    }

    #[test]
    fn test_config_builder_partial_override() {
        let config = from_toml(
            r#"
            [sync]
            concurrency = 8
        "#,
        );

        assert_eq!(config.sync.concurrency, 8);
        assert_eq!(config.sync.page_size, 100);
        assert!(config.sync.include_comments);
    }

    #[test]
    fn test_config_merging_order() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[sync]\npage_size = 20\nconcurrency = 2",
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                "[sync]\npage_size = 30",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.sync.page_size, 30);
        assert_eq!(config.sync.concurrency, 2);
    }

    #[test]
    fn test_legacy_variables_override_files() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_TOKEN", "ghp_env"),
            ("GITHUB_OWNER", "hubot"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();

        let builder = ConfigBuilder::builder().add_source(config::File::from_str(
            "[github]\ntoken = \"ghp_file\"\n[sync]\nowner = \"octocat\"",
            FileFormat::Toml,
        ));
        let config: Config =
            with_legacy_variables(builder, |name| env.get(name).map(|v| v.to_string()))
                .unwrap()
                .build()
                .unwrap()
                .try_deserialize()
                .unwrap();

        assert_eq!(config.github.token.as_deref(), Some("ghp_env"));
        assert_eq!(config.sync.owner.as_deref(), Some("hubot"));
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_absent_legacy_variables_leave_config_alone() {
        let builder = ConfigBuilder::builder().add_source(config::File::from_str(
            "[github]\ntoken = \"ghp_file\"",
            FileFormat::Toml,
        ));
        let config: Config = with_legacy_variables(builder, |_| None)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.github.token.as_deref(), Some("ghp_file"));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let config = Config::default();
        assert!(config.github_token().is_err());

        let blank = from_toml("[github]\ntoken = \"  \"");
        assert!(blank.github_token().is_err());
    }

    #[test]
    fn test_owner_prefers_cli_argument() {
        let config = from_toml("[sync]\nowner = \"octocat\"");
        assert_eq!(config.owner(Some("hubot".to_string())), Ok("hubot".to_string()));
        assert_eq!(config.owner(None), Ok("octocat".to_string()));
        assert!(Config::default().owner(None).is_err());
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let url = Config::default().database_url().unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.contains("hubmirror.db"));
        assert!(url.ends_with("?mode=rwc"));
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[sync\npage_size = 1", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml("[sync]\npage_size = 10\nunknown_field = \"ignored\"");
        assert_eq!(config.sync.page_size, 10);
    }
}
