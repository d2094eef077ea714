//! Page-numbered walking of list endpoints.
//!
//! A walk requests `page=1, 2, ...` and stops at the first page that is empty or
//! shorter than the requested page size. All pages are accumulated before returning,
//! because callers need the full set to count results and thread foreign keys.

use serde_json::Value;

use crate::fetch::{FetchError, Fetcher, Result};
use crate::sync::{ProgressCallback, SyncProgress, emit};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest `per_page` the upstream honours.
pub const MAX_PAGE_SIZE: u32 = 100;

/// What to walk and how to interpret failures.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Label for logs and progress events.
    pub resource: String,
    /// Endpoint path relative to the API root.
    pub endpoint: String,
    /// Fixed query parameters sent with every page.
    pub params: Vec<(&'static str, String)>,
    pub page_size: u32,
    /// A status which, on the first page, means "nothing here" rather than failure.
    pub empty_on_status: Option<u16>,
}

impl WalkConfig {
    fn new(resource: String, endpoint: String) -> Self {
        Self {
            resource,
            endpoint,
            params: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            empty_on_status: None,
        }
    }

    /// An owner's repositories, most recently updated first.
    pub fn repositories(owner: &str) -> Self {
        let mut config = Self::new(format!("{owner}/repositories"), format!("/users/{owner}/repos"));
        config.params.push(("sort", "updated".to_string()));
        config
    }

    /// A repository's commits. An empty repository answers 409.
    pub fn commits(owner: &str, repo: &str) -> Self {
        let mut config = Self::new(
            format!("{owner}/{repo}/commits"),
            format!("/repos/{owner}/{repo}/commits"),
        );
        config.empty_on_status = Some(409);
        config
    }

    /// A repository's contributors. Repositories without any answer 404.
    pub fn contributors(owner: &str, repo: &str) -> Self {
        let mut config = Self::new(
            format!("{owner}/{repo}/contributors"),
            format!("/repos/{owner}/{repo}/contributors"),
        );
        config.empty_on_status = Some(404);
        config
    }

    /// Open and closed pull requests.
    pub fn pull_requests(owner: &str, repo: &str) -> Self {
        let mut config = Self::new(
            format!("{owner}/{repo}/pulls"),
            format!("/repos/{owner}/{repo}/pulls"),
        );
        config.params.push(("state", "all".to_string()));
        config
    }

    /// Open and closed issues. The upstream mixes pull requests into this listing.
    pub fn issues(owner: &str, repo: &str) -> Self {
        let mut config = Self::new(
            format!("{owner}/{repo}/issues"),
            format!("/repos/{owner}/{repo}/issues"),
        );
        config.params.push(("state", "all".to_string()));
        config
    }

    pub fn issue_comments(owner: &str, repo: &str, number: i64) -> Self {
        Self::new(
            format!("{owner}/{repo}#{number}/comments"),
            format!("/repos/{owner}/{repo}/issues/{number}/comments"),
        )
    }

    /// Review comments on a pull request's diff.
    pub fn pull_request_comments(owner: &str, repo: &str, number: i64) -> Self {
        Self::new(
            format!("{owner}/{repo}!{number}/comments"),
            format!("/repos/{owner}/{repo}/pulls/{number}/comments"),
        )
    }

    /// Set the page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

/// Items collected by a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub items: Vec<Value>,
    /// Number of page requests issued.
    pub requests: u32,
}

/// Walk every page of `config.endpoint`.
///
/// # Errors
/// Any fetch failure propagates, except `config.empty_on_status` on page 1, which
/// yields an empty result.
pub async fn walk(
    fetcher: &Fetcher,
    config: &WalkConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<WalkResult> {
    let mut result = WalkResult::default();
    let mut page = 1u32;

    loop {
        let mut params = config.params.clone();
        params.push(("per_page", config.page_size.to_string()));
        params.push(("page", page.to_string()));

        result.requests += 1;
        let body = match fetcher.fetch(&config.endpoint, &params).await {
            Ok(body) => body,
            Err(e) if page == 1 && config.empty_on_status.is_some_and(|s| e.is_status(s)) => {
                tracing::debug!(
                    resource = %config.resource,
                    status = e.status(),
                    "Treating first-page status as an empty listing"
                );
                emit(
                    on_progress,
                    SyncProgress::Warning {
                        message: format!("{}: {e}, treated as empty", config.resource),
                    },
                );
                return Ok(result);
            }
            Err(e) => return Err(e),
        };

        let items = match body {
            Value::Array(items) => items,
            // 204 No Content, e.g. contributors of an empty repository
            Value::Null => break,
            other => {
                return Err(FetchError::Decode {
                    url: config.endpoint.clone(),
                    message: format!("expected a JSON array, got {}", json_kind(&other)),
                });
            }
        };

        let count = items.len();
        result.items.extend(items);

        emit(
            on_progress,
            SyncProgress::FetchedPage {
                resource: config.resource.clone(),
                page,
                count,
                total_so_far: result.items.len(),
            },
        );

        if count == 0 || count < config.page_size as usize {
            break;
        }
        page += 1;
    }

    tracing::debug!(
        resource = %config.resource,
        items = result.items.len(),
        requests = result.requests,
        "Walk complete"
    );
    Ok(result)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fetch::FetcherConfig;
    use crate::http::{HttpResponse, MockTransport};

    const API: &str = "https://api.example.com";

    fn fetcher(transport: &MockTransport) -> Fetcher {
        Fetcher::new(
            FetcherConfig::new("t").with_api_url(API),
            Arc::new(transport.clone()),
        )
        .expect("fetcher should build")
    }

    fn page_of(len: usize, offset: usize) -> Value {
        Value::Array((0..len).map(|i| serde_json::json!({ "id": offset + i })).collect())
    }

    fn status(code: u16) -> HttpResponse {
        HttpResponse {
            status: code,
            headers: Vec::new(),
            body: br#"{"message":"nope"}"#.to_vec(),
        }
    }

    #[tokio::test]
    async fn stops_after_short_page() {
        let transport = MockTransport::new();
        let sizes = [100, 100, 100, 37];
        for (i, size) in sizes.iter().enumerate() {
            transport.push_json(
                format!("{API}/repos/o/r/pulls?state=all&per_page=100&page={}", i + 1),
                page_of(*size, i * 100),
            );
        }

        let result = walk(&fetcher(&transport), &WalkConfig::pull_requests("o", "r"), None)
            .await
            .expect("walk should succeed");

        assert_eq!(result.items.len(), 337);
        assert_eq!(result.requests, 4);
        assert_eq!(transport.requests().len(), 4);
        assert_eq!(result.items[336]["id"], 336);
    }

    #[tokio::test]
    async fn stops_after_empty_page() {
        let transport = MockTransport::new();
        for (i, size) in [100, 100, 0].iter().enumerate() {
            transport.push_json(
                format!("{API}/repos/o/r/commits?per_page=100&page={}", i + 1),
                page_of(*size, i * 100),
            );
        }

        let result = walk(&fetcher(&transport), &WalkConfig::commits("o", "r"), None)
            .await
            .expect("walk should succeed");

        assert_eq!(result.items.len(), 200);
        assert_eq!(result.requests, 3);
    }

    #[tokio::test]
    async fn honours_custom_page_size() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/users/o/repos?sort=updated&per_page=2&page=1"),
            page_of(2, 0),
        );
        transport.push_json(
            format!("{API}/users/o/repos?sort=updated&per_page=2&page=2"),
            page_of(1, 2),
        );

        let config = WalkConfig::repositories("o").with_page_size(2);
        let result = walk(&fetcher(&transport), &config, None)
            .await
            .expect("walk should succeed");
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.requests, 2);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(WalkConfig::issues("o", "r").with_page_size(0).page_size, 1);
        assert_eq!(WalkConfig::issues("o", "r").with_page_size(500).page_size, 100);
    }

    #[tokio::test]
    async fn empty_repository_commits_yield_nothing() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/empty/commits?per_page=100&page=1"),
            status(409),
        );

        let result = walk(&fetcher(&transport), &WalkConfig::commits("o", "empty"), None)
            .await
            .expect("409 on commits is an empty result");
        assert!(result.items.is_empty());
        assert_eq!(result.requests, 1);
    }

    #[tokio::test]
    async fn empty_listing_is_reported_as_a_warning() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/empty/commits?per_page=100&page=1"),
            status(409),
        );

        let warnings = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&warnings);
        let callback: ProgressCallback = Box::new(move |event| {
            if let SyncProgress::Warning { message } = event {
                sink.lock().expect("warnings lock").push(message);
            }
        });

        walk(
            &fetcher(&transport),
            &WalkConfig::commits("o", "empty"),
            Some(&callback),
        )
        .await
        .expect("409 on commits is an empty result");

        let warnings = warnings.lock().expect("warnings lock");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("o/empty/commits"));
        assert!(warnings[0].contains("409"));
    }

    #[tokio::test]
    async fn missing_contributors_yield_nothing() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/r/contributors?per_page=100&page=1"),
            status(404),
        );

        let result = walk(&fetcher(&transport), &WalkConfig::contributors("o", "r"), None)
            .await
            .expect("404 on contributors is an empty result");
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn no_content_response_ends_the_listing() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/empty/contributors?per_page=100&page=1"),
            HttpResponse {
                status: 204,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let result = walk(
            &fetcher(&transport),
            &WalkConfig::contributors("o", "empty"),
            None,
        )
        .await
        .expect("204 is an empty listing");
        assert!(result.items.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_status_only_applies_to_its_own_resource() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/r/issues?state=all&per_page=100&page=1"),
            status(409),
        );

        let err = walk(&fetcher(&transport), &WalkConfig::issues("o", "r"), None)
            .await
            .expect_err("409 on issues is an error");
        assert!(err.is_status(409));
    }

    #[tokio::test]
    async fn empty_status_after_first_page_is_an_error() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/o/r/commits?per_page=100&page=1"),
            page_of(100, 0),
        );
        transport.push_response(
            format!("{API}/repos/o/r/commits?per_page=100&page=2"),
            status(409),
        );

        let err = walk(&fetcher(&transport), &WalkConfig::commits("o", "r"), None)
            .await
            .expect_err("409 on a later page is an error");
        assert!(err.is_status(409));
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{API}/repos/o/r/contributors?per_page=100&page=1"),
            status(500),
        );

        let err = walk(&fetcher(&transport), &WalkConfig::contributors("o", "r"), None)
            .await
            .expect_err("500 propagates");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn non_array_body_is_a_decode_error() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/o/r/issues/7/comments?per_page=100&page=1"),
            serde_json::json!({"message": "weird"}),
        );

        let err = walk(
            &fetcher(&transport),
            &WalkConfig::issue_comments("o", "r", 7),
            None,
        )
        .await
        .expect_err("object body is not a page");
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn emits_one_progress_event_per_page() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/o/r/pulls/3/comments?per_page=1&page=1"),
            page_of(1, 0),
        );
        transport.push_json(
            format!("{API}/repos/o/r/pulls/3/comments?per_page=1&page=2"),
            page_of(0, 0),
        );

        let pages = Arc::new(AtomicUsize::new(0));
        let pages_clone = Arc::clone(&pages);
        let callback: ProgressCallback = Box::new(move |event| {
            if let SyncProgress::FetchedPage { .. } = event {
                pages_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        let config = WalkConfig::pull_request_comments("o", "r", 3).with_page_size(1);
        walk(&fetcher(&transport), &config, Some(&callback))
            .await
            .expect("walk should succeed");
        assert_eq!(pages.load(Ordering::SeqCst), 2);
    }
}
