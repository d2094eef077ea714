use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::http::HttpResponse;

/// Header carrying the number of requests left in the current window.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the window reset time as epoch seconds.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Local estimate of the upstream request quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Requests left before the upstream starts rejecting calls.
    pub remaining: u32,
    /// When the upstream replenishes the quota.
    pub reset_at: DateTime<Utc>,
}

impl QuotaState {
    /// Initial estimate: a full hourly window starting now.
    pub fn initial(requests_per_hour: u32, now: DateTime<Utc>) -> Self {
        Self {
            remaining: requests_per_hour,
            reset_at: now + chrono::Duration::hours(1),
        }
    }

    /// How long a caller must wait before the next request, if at all.
    ///
    /// A caller waits only when at most one unit is left and the reset lies in the future.
    pub fn wait_needed(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.remaining > 1 {
            return None;
        }
        (self.reset_at - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Reserve one unit for a request about to be sent.
    pub fn reserve(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Overwrite the estimate from the response's rate-limit headers.
    ///
    /// Each header is applied independently. A response without them leaves the
    /// estimate as it is.
    pub fn observe(&mut self, response: &HttpResponse) {
        if let Some(remaining) = response
            .header(REMAINING_HEADER)
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.remaining = remaining;
        }
        if let Some(reset_at) = response
            .header(RESET_HEADER)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        {
            self.reset_at = reset_at;
        }
    }
}
