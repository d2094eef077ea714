//! Rate-limited access to the upstream REST API.
//!
//! [`Fetcher`] performs a single `GET` and keeps a local estimate of the request
//! quota. Before each call it checks the estimate and, when at most one request is
//! left, suspends until the reset time. After each call it overwrites the estimate
//! from the `x-ratelimit-*` response headers, which are authoritative because the
//! same credential may be in use elsewhere.
//!
//! The fetcher never retries. Callers decide which HTTP failures are recoverable.
//!
//! # Example
//!
//! ```ignore
//! use hubmirror::fetch::{Fetcher, FetcherConfig};
//!
//! let fetcher = Fetcher::from_config(FetcherConfig::new(token))?;
//! let repos = fetcher
//!     .fetch("/users/octocat/repos", &[("per_page", "100".to_string())])
//!     .await?;
//! ```

mod errors;
mod quota;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use url::Url;

use crate::http::{DEFAULT_REQUEST_TIMEOUT, HttpRequest, HttpTransport, ReqwestTransport};

pub use errors::{FetchError, Result};
pub use quota::{QuotaState, REMAINING_HEADER, RESET_HEADER};

/// Public GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub's authenticated hourly request allowance.
pub const DEFAULT_REQUESTS_PER_HOUR: u32 = 5000;

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("hubmirror/", env!("CARGO_PKG_VERSION"));

/// Settings for constructing a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API root, e.g. `https://api.github.com` or `https://ghe.example.com/api/v3`.
    pub api_url: String,
    /// Bearer credential.
    pub token: String,
    /// Initial quota estimate, used until the first response reports the real one.
    pub requests_per_hour: u32,
    /// Upper bound on a single rate-limit wait. `None` waits as long as needed.
    pub max_wait: Option<Duration>,
    /// Per-request network timeout.
    pub request_timeout: Duration,
}

impl FetcherConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            requests_per_hour: DEFAULT_REQUESTS_PER_HOUR,
            max_wait: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_requests_per_hour(mut self, requests_per_hour: u32) -> Self {
        self.requests_per_hour = requests_per_hour;
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Rate-limited client for the upstream API.
///
/// Clones share one quota estimate, so concurrent tasks draw from the same budget.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    api_url: Arc<str>,
    token: Arc<str>,
    quota: Arc<Mutex<QuotaState>>,
    max_wait: Option<Duration>,
}

impl Fetcher {
    /// Build a fetcher on top of an arbitrary transport.
    pub fn new(config: FetcherConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let api_url = config.api_url.trim_end_matches('/').to_string();
        Url::parse(&api_url).map_err(|e| FetchError::InvalidUrl {
            url: api_url.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            transport,
            api_url: api_url.into(),
            token: config.token.into(),
            quota: Arc::new(Mutex::new(QuotaState::initial(
                config.requests_per_hour,
                Utc::now(),
            ))),
            max_wait: config.max_wait,
        })
    }

    /// Build a fetcher backed by reqwest.
    pub fn from_config(config: FetcherConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.request_timeout).map_err(|e| {
            FetchError::Transport {
                url: config.api_url.clone(),
                message: e.0,
            }
        })?;
        Self::new(config, Arc::new(transport))
    }

    /// Replace the quota estimate, e.g. with state observed by an earlier run.
    #[must_use]
    pub fn with_quota(self, state: QuotaState) -> Self {
        *self.lock_quota() = state;
        self
    }

    /// Snapshot of the current quota estimate.
    pub fn quota(&self) -> QuotaState {
        *self.lock_quota()
    }

    /// GET `endpoint` with `params` and parse the body as JSON.
    ///
    /// # Errors
    /// - [`FetchError::RateLimitWaitExceeded`] if the quota is exhausted for longer than `max_wait`
    /// - [`FetchError::Transport`] if no response arrives
    /// - [`FetchError::Http`] for any non-2xx status
    /// - [`FetchError::Decode`] if the body is not JSON
    pub async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint, params)?;
        self.acquire_quota().await?;

        let response = self
            .transport
            .send(HttpRequest {
                url: url.clone(),
                headers: self.request_headers(),
            })
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.0,
            })?;

        self.lock_quota().observe(&response);

        if !response.is_success() {
            tracing::debug!(status = response.status, url = %url, "Upstream returned an error status");
            return Err(FetchError::Http {
                status: response.status,
                url,
                body: errors::truncate_body(&response.body),
            });
        }

        if response.body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Block until the quota allows another request, then reserve one unit.
    async fn acquire_quota(&self) -> Result<()> {
        let pending = {
            let mut quota = self.lock_quota();
            match quota.wait_needed(Utc::now()) {
                Some(wait) => Some((wait, quota.reset_at)),
                None => {
                    quota.reserve();
                    None
                }
            }
        };

        if let Some((wait, reset_at)) = pending {
            if let Some(max_wait) = self.max_wait
                && wait > max_wait
            {
                return Err(FetchError::RateLimitWaitExceeded { reset_at, max_wait });
            }
            tracing::warn!(
                wait_secs = wait.as_secs(),
                reset_at = %reset_at,
                "Rate limit reached, waiting for reset"
            );
            tokio::time::sleep(wait).await;
        }

        Ok(())
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let raw = format!("{}{}", self.api_url, endpoint);
        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), ACCEPT.to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.token),
            ),
        ]
    }

    fn lock_quota(&self) -> MutexGuard<'_, QuotaState> {
        self.quota.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
