use crate::adapters::rate_limit::{
    detect_rate_limit, RateLimitEvent, RateLimitKind, RateLimitPolicy, RetryConfig, ThrottlePolicy,
};
use crate::domain::model::{MemberRecord, MembershipRequest, Roster};
use crate::domain::ports::DirectoryProvider;
use crate::utils::error::{BackfillError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use url::Url;

pub const PAGE_SIZE: usize = 100;
const API_VERSION: &str = "2022-11-28";

#[derive(Clone)]
pub struct ClientOptions {
    pub api_url: Url,
    pub user_agent: String,
    pub retry: RetryConfig,
    pub policy: Arc<dyn RateLimitPolicy>,
}

impl ClientOptions {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            user_agent: concat!("team-backfill/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryConfig::default(),
            policy: Arc::new(ThrottlePolicy),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn RateLimitPolicy>) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base: Url,
    retry: RetryConfig,
    policy: Arc<dyn RateLimitPolicy>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base", &self.base.as_str())
            .field("retry", &self.retry)
            .finish()
    }
}

impl GitHubClient {
    pub fn connect(credential: &str, options: ClientOptions) -> Result<Self> {
        tracing::info!(api_url = %options.api_url, "Creating new GitHub client");

        if options.api_url.cannot_be_a_base() {
            return Err(BackfillError::client(format!(
                "API URL cannot carry paths: {}",
                options.api_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credential))
            .map_err(|e| BackfillError::client(format!("invalid credential: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| BackfillError::client(e.to_string()))?;

        Ok(Self {
            http,
            base: options.api_url,
            retry: options.retry,
            policy: options.policy,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BackfillError::client(format!("API URL cannot carry paths: {}", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn first_page(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut()
            .append_pair("per_page", &PAGE_SIZE.to_string())
            .append_pair("page", "1");
        Ok(url)
    }

    /// The token rides on every request, so pagination never leaves the API host.
    fn same_origin(&self, url: Url) -> Result<Url> {
        if url.origin() != self.base.origin() {
            tracing::error!(
                next = %url,
                api_url = %self.base,
                "Pagination link points to another host"
            );
            return Err(BackfillError::client(format!(
                "refusing to follow pagination link to another host: {}",
                url
            )));
        }
        Ok(url)
    }

    /// Send a request with transient-failure retry and rate-limit handling.
    ///
    /// The retry count is shared by both mechanisms, so a request that was already
    /// retried for a 5xx does not get another retry for a primary rate limit.
    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let mut retry_count: u32 = 0;

        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(json_body) = body {
                request = request.json(json_body);
            }

            tracing::debug!(method = %method, url = %url, retry_count, "Sending request");

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if retry_count < self.retry.max_retries => {
                    retry_count += 1;
                    let backoff = self.retry.calculate_backoff(retry_count);
                    tracing::warn!(
                        method = %method,
                        url = %url,
                        error = %e,
                        retry_count,
                        wait_ms = backoff.as_millis() as u64,
                        "Request failed, retrying with backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                Err(e) => return Err(BackfillError::ApiError(e)),
            };

            let status = response.status();
            tracing::debug!(method = %method, url = %url, status = %status, "Received response");
            if status.is_success() {
                return Ok(response);
            }

            let headers = response.headers().clone();
            let message = error_message(response).await;

            if let Some((kind, wait)) =
                detect_rate_limit(status.as_u16(), &headers, &message, chrono::Utc::now())
            {
                let event = RateLimitEvent {
                    kind,
                    method: method.as_str(),
                    url: url.as_str(),
                    retry_after: wait,
                    retry_count,
                };
                let retry = match kind {
                    RateLimitKind::Primary => {
                        tracing::warn!(
                            method = %method,
                            url = %url,
                            "Request quota exhausted for request"
                        );
                        self.policy.on_primary_limit(&event)
                    }
                    RateLimitKind::Secondary => {
                        tracing::warn!(
                            method = %method,
                            url = %url,
                            "Secondary rate limit detected for request"
                        );
                        self.policy.on_secondary_limit(&event)
                    }
                };

                if retry {
                    tracing::info!("Retrying after {} seconds!", wait.as_secs());
                    tokio::time::sleep(wait).await;
                    retry_count += 1;
                    continue;
                }
            } else if self.retry.should_retry(status.as_u16())
                && retry_count < self.retry.max_retries
            {
                retry_count += 1;
                let backoff = self.retry.calculate_backoff(retry_count);
                tracing::warn!(
                    method = %method,
                    url = %url,
                    status = %status,
                    retry_count,
                    wait_ms = backoff.as_millis() as u64,
                    "Transient error, retrying with backoff"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            return Err(BackfillError::ApiStatus {
                status: status.as_u16(),
                message,
            });
        }
    }

    /// Collect every page of a member listing into one roster.
    async fn paginate(&self, first: Url) -> Result<Roster> {
        let mut roster = Roster::new();
        let mut next = Some(first);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response = self.send(Method::GET, &url, None).await?;
            let next_link = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let page: Vec<MemberRecord> = response.json().await?;
            pages += 1;
            let full_page = page.len() >= PAGE_SIZE;
            for member in page {
                roster.insert(member.login);
            }

            if full_page {
                next = match next_link {
                    Some(link) => Some(self.same_origin(Url::parse(&link)?)?),
                    None => None,
                };
            }
        }

        tracing::debug!(pages, members = roster.len(), "Pagination finished");
        Ok(roster)
    }
}

#[async_trait]
impl DirectoryProvider for GitHubClient {
    async fn list_org_members(&self, org: &str) -> Result<Roster> {
        let url = self.first_page(&["orgs", org, "members"])?;
        self.paginate(url).await
    }

    async fn list_team_members(&self, org: &str, team: &str) -> Result<Roster> {
        let url = self.first_page(&["orgs", org, "teams", team, "members"])?;
        self.paginate(url).await
    }

    async fn add_team_member(&self, request: &MembershipRequest) -> Result<()> {
        let url = self.endpoint(&[
            "orgs",
            &request.organization,
            "teams",
            &request.team,
            "memberships",
            &request.member,
        ])?;
        let body = serde_json::json!({ "role": request.role });
        self.send(Method::PUT, &url, Some(&body)).await?;
        Ok(())
    }
}

/// GitHub puts the error text in a JSON `message` field; fall back to the raw body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => text,
    }
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("link pattern is valid")
    })
}

/// Extracts the `rel="next"` target of a Link header.
pub fn next_page_url(link: &str) -> Option<String> {
    link_pattern()
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
