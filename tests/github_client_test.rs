use httpmock::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use team_backfill::core::DirectoryProvider;
use team_backfill::{BackfillError, ClientOptions, GitHubClient, RetryConfig};
use url::Url;

fn client_for(server: &MockServer, retry: RetryConfig) -> GitHubClient {
    let options = ClientOptions::new(Url::parse(&server.base_url()).unwrap()).with_retry(retry);
    GitHubClient::connect("test-token", options).unwrap()
}

fn fast_retry() -> RetryConfig {
    RetryConfig::default().with_initial_backoff(Duration::from_millis(5))
}

fn members(range: std::ops::Range<usize>) -> Value {
    Value::Array(
        range
            .map(|i| json!({ "login": format!("user{}", i), "id": i, "type": "User" }))
            .collect(),
    )
}

/// 250 位成員分三頁，透過 Link header 串接
#[tokio::test]
async fn test_org_roster_assembled_across_pages() {
    let server = MockServer::start_async().await;
    let page2 = server.url("/orgs/acme/members?per_page=100&page=2");
    let page3 = server.url("/orgs/acme/members?per_page=100&page=3");

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("per_page", "100")
                .query_param("page", "1")
                .header("authorization", "Bearer test-token")
                .header("accept", "application/vnd.github+json");
            then.status(200)
                .header(
                    "link",
                    format!(r#"<{}>; rel="next", <{}>; rel="last""#, page2, page3),
                )
                .json_body(members(0..100));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("page", "2");
            then.status(200)
                .header(
                    "link",
                    format!(r#"<{}>; rel="next", <{}>; rel="last""#, page3, page3),
                )
                .json_body(members(100..200));
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("page", "3");
            then.status(200)
                .header("link", format!(r#"<{}>; rel="prev""#, page2))
                .json_body(members(200..250));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let roster = client.list_org_members("acme").await.unwrap();

    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;
    third.assert_hits_async(1).await;
    assert_eq!(roster.len(), 250);
    assert!(roster.contains("user0"));
    assert!(roster.contains("user249"));
    let logins: Vec<&String> = roster.iter().collect();
    assert_eq!(logins[100], "user100");
}

#[tokio::test]
async fn test_short_page_ends_pagination() {
    let server = MockServer::start_async().await;
    let page2 = server.url("/orgs/acme/teams/infra/members?per_page=100&page=2");

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/teams/infra/members")
                .query_param("page", "1");
            then.status(200)
                .header("link", format!(r#"<{}>; rel="next""#, page2))
                .json_body(json!([{ "login": "bob" }, { "login": "dave" }]));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/teams/infra/members")
                .query_param("page", "2");
            then.status(200).json_body(json!([{ "login": "zed" }]));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let roster = client.list_team_members("acme", "infra").await.unwrap();

    first.assert_hits_async(1).await;
    second.assert_hits_async(0).await;
    assert_eq!(roster.len(), 2);
    assert!(roster.contains("bob"));
}

#[tokio::test]
async fn test_failed_last_page_fails_whole_listing() {
    let server = MockServer::start_async().await;
    let page2 = server.url("/orgs/acme/members?per_page=100&page=2");

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("page", "1");
            then.status(200)
                .header("link", format!(r#"<{}>; rel="next""#, page2))
                .json_body(members(0..100));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("page", "2");
            then.status(404).json_body(json!({ "message": "Not Found" }));
        })
        .await;

    let client = client_for(&server, RetryConfig::disabled());
    let err = client.list_org_members("acme").await.unwrap_err();

    match err {
        BackfillError::ApiStatus { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_primary_rate_limit_retried_once_then_succeeds() {
    let server = MockServer::start_async().await;
    let mut limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(403)
                .header("x-ratelimit-remaining", "0")
                .header("retry-after", "1")
                .json_body(json!({ "message": "API rate limit exceeded for installation." }));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let handle = tokio::spawn(async move { client.list_org_members("acme").await });

    // 等第一次請求被限流後，換成正常回應
    let mut waited = 0;
    while limited.hits_async().await == 0 {
        assert!(waited < 500, "first request never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    limited.delete_async().await;

    let ok = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(200).json_body(json!([{ "login": "alice" }]));
        })
        .await;

    let roster = handle.await.unwrap().unwrap();
    ok.assert_hits_async(1).await;
    assert_eq!(roster.len(), 1);
    assert!(roster.contains("alice"));
}

#[tokio::test]
async fn test_primary_rate_limit_not_retried_twice() {
    let server = MockServer::start_async().await;
    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(403)
                .header("x-ratelimit-remaining", "0")
                .header("retry-after", "0")
                .json_body(json!({ "message": "API rate limit exceeded for installation." }));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let err = client.list_org_members("acme").await.unwrap_err();

    limited.assert_hits_async(2).await;
    assert!(matches!(err, BackfillError::ApiStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_secondary_rate_limit_is_not_retried() {
    let server = MockServer::start_async().await;
    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(403).header("retry-after", "60").json_body(json!({
                "message": "You have exceeded a secondary rate limit. Please wait a few minutes before you try again."
            }));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let started = std::time::Instant::now();
    let err = client.list_org_members("acme").await.unwrap_err();

    limited.assert_hits_async(1).await;
    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(err.to_string().contains("secondary rate limit"));
}

#[tokio::test]
async fn test_transient_server_errors_are_retried() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(502);
        })
        .await;

    let client = client_for(&server, fast_retry());
    let err = client.list_org_members("acme").await.unwrap_err();

    // 一次原始請求加三次重試
    failing.assert_hits_async(4).await;
    assert!(matches!(err, BackfillError::ApiStatus { status: 502, .. }));
}

#[tokio::test]
async fn test_add_member_sends_member_role() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/orgs/acme/teams/infra/memberships/alice")
                .header("authorization", "Bearer test-token")
                .json_body(json!({ "role": "member" }));
            then.status(200)
                .json_body(json!({ "state": "active", "role": "member" }));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let request = team_backfill::domain::model::MembershipRequest::member("acme", "infra", "alice");
    client.add_team_member(&request).await.unwrap();

    put.assert_hits_async(1).await;
}

/// 5xx 重試過一次後，接著遇到 primary 限流就不再重試
#[tokio::test]
async fn test_rate_limit_after_server_error_shares_retry_count() {
    let server = MockServer::start_async().await;
    let mut flaky = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(502);
        })
        .await;

    let retry = RetryConfig::default().with_initial_backoff(Duration::from_secs(1));
    let client = client_for(&server, retry);
    let handle = tokio::spawn(async move { client.list_org_members("acme").await });

    let mut waited = 0;
    while flaky.hits_async().await == 0 {
        assert!(waited < 500, "first request never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    assert_eq!(flaky.hits_async().await, 1);
    flaky.delete_async().await;

    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/orgs/acme/members");
            then.status(403)
                .header("x-ratelimit-remaining", "0")
                .header("retry-after", "0")
                .json_body(json!({ "message": "API rate limit exceeded for installation." }));
        })
        .await;

    let err = handle.await.unwrap().unwrap_err();

    limited.assert_hits_async(1).await;
    assert!(matches!(err, BackfillError::ApiStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_pagination_link_to_other_host_is_refused() {
    let server = MockServer::start_async().await;
    let elsewhere = MockServer::start_async().await;
    let foreign_page = elsewhere.url("/orgs/acme/members?per_page=100&page=2");

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/orgs/acme/members")
                .query_param("page", "1");
            then.status(200)
                .header("link", format!(r#"<{}>; rel="next""#, foreign_page))
                .json_body(members(0..100));
        })
        .await;
    let stolen = elsewhere
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!([]));
        })
        .await;

    let client = client_for(&server, fast_retry());
    let err = client.list_org_members("acme").await.unwrap_err();

    stolen.assert_hits_async(0).await;
    assert!(matches!(err, BackfillError::ClientError { .. }));
    assert!(err.to_string().contains("another host"));
}
