//! Throttling and retry decisions for the directory client.
//!
//! The client classifies every failed response; this module decides whether it
//! is retried and how long to wait first.

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::sync::OnceLock;
use std::time::Duration;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Wait hint used for a secondary limit that carries no Retry-After header.
const DEFAULT_SECONDARY_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Ordinary quota exhaustion.
    Primary,
    /// Abuse detection ("secondary rate limit").
    Secondary,
}

#[derive(Debug, Clone)]
pub struct RateLimitEvent<'a> {
    pub kind: RateLimitKind,
    pub method: &'a str,
    pub url: &'a str,
    pub retry_after: Duration,
    /// Retries already performed for this request, of any kind.
    pub retry_count: u32,
}

/// Decides whether a rate-limited request is retried.
pub trait RateLimitPolicy: Send + Sync {
    fn on_primary_limit(&self, event: &RateLimitEvent<'_>) -> bool;
    fn on_secondary_limit(&self, event: &RateLimitEvent<'_>) -> bool;
}

/// Retries a primary limit once per request and never retries a secondary limit,
/// so an abuse flag is not amplified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrottlePolicy;

impl RateLimitPolicy for ThrottlePolicy {
    fn on_primary_limit(&self, event: &RateLimitEvent<'_>) -> bool {
        event.retry_count == 0
    }

    fn on_secondary_limit(&self, _event: &RateLimitEvent<'_>) -> bool {
        false
    }
}

/// Transient-failure retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            retry_status_codes: vec![500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64()
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        Duration::from_secs_f64(base.min(self.max_backoff.as_secs_f64()))
    }

    pub fn should_retry(&self, status_code: u16) -> bool {
        self.retry_status_codes.contains(&status_code)
    }
}

pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Time left until the epoch-seconds quota reset, floored at zero.
pub fn until_reset(reset_epoch: i64, now: DateTime<Utc>) -> Duration {
    let seconds = reset_epoch - now.timestamp();
    Duration::from_secs(seconds.max(0) as u64)
}

fn secondary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bsecondary rate\b|\babuse\b").expect("secondary limit pattern is valid")
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Classifies a failed response as a rate limit, with the wait hint it carries.
pub fn detect_rate_limit(
    status: u16,
    headers: &HeaderMap,
    message: &str,
    now: DateTime<Utc>,
) -> Option<(RateLimitKind, Duration)> {
    if status != 403 && status != 429 {
        return None;
    }

    let retry_after = header_str(headers, RETRY_AFTER.as_str()).and_then(parse_retry_after);

    if secondary_pattern().is_match(message) {
        return Some((
            RateLimitKind::Secondary,
            retry_after.unwrap_or(DEFAULT_SECONDARY_WAIT),
        ));
    }

    let exhausted = header_str(headers, RATE_LIMIT_REMAINING).map(str::trim) == Some("0");
    if exhausted || status == 429 {
        let wait = retry_after
            .or_else(|| {
                header_str(headers, RATE_LIMIT_RESET)
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .map(|reset| until_reset(reset, now))
            })
            .unwrap_or(Duration::ZERO);
        return Some((RateLimitKind::Primary, wait));
    }

    None
}
