use crate::common::{listing, mount_create_task, page_html, ready_reply, solver_for, UNREACHABLE};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use threadgrab::output::{JsonFileSink, ResultSink};
use threadgrab::pipeline::{Orchestrator, ScrapeRequest};
use threadgrab::ScrapeError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_PATH: &str = "/r/test/comments/abc123/hello_world/";

/// Mounts the discussion page at [`PAGE_PATH`]
async fn mount_page(server: &MockServer, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, children: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/comments/abc123.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(children)))
        .mount(server)
        .await;
}

fn orchestrator_for(server: &MockServer) -> Orchestrator {
    Orchestrator::new(
        reqwest::Client::new(),
        &format!("{}/comments", server.uri()),
    )
}

fn request_for(server: &MockServer) -> ScrapeRequest {
    ScrapeRequest::new(format!("{}{}", server.uri(), PAGE_PATH)).unwrap()
}

#[tokio::test]
async fn test_scrape_heading_and_first_two_comments() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 200, page_html("Hello", None)).await;
    mount_listing(
        &mock_server,
        &[("c1", "first"), ("c2", "second"), ("c3", "ignored")],
    )
    .await;

    let dir = TempDir::new().unwrap();
    let sink = Arc::new(JsonFileSink::new(dir.path().join("scrape_results.json")));
    let orchestrator = orchestrator_for(&mock_server).with_sink(sink.clone());

    let result = orchestrator
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .expect("scrape should succeed");

    assert_eq!(result.heading, "Hello");
    assert_eq!(result.url, format!("{}{}", mock_server.uri(), PAGE_PATH));
    let ids: Vec<&str> = result.comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(result.comments[1].body, "second");
    assert!(result.challenge_site_key.is_none());
    assert!(!result.html.contains('\n'));
    assert!(result.html.contains(r#"<h1 slot="title">Hello</h1>"#));
    assert!(!result.elapsed.is_empty());

    let stored = sink.load().await.unwrap().expect("result should be persisted");
    assert_eq!(stored, result);
}

#[tokio::test]
async fn test_comment_service_unreachable_degrades_to_empty() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 200, page_html("Hello", None)).await;

    let orchestrator = Orchestrator::new(
        reqwest::Client::new(),
        &format!("{}/comments", UNREACHABLE),
    );

    let result = orchestrator
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .expect("comment failures must not fail the request");

    assert_eq!(result.heading, "Hello");
    assert!(result.comments.is_empty());
}

#[tokio::test]
async fn test_malformed_listing_degrades_to_empty() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 200, page_html("Hello", None)).await;

    Mock::given(method("GET"))
        .and(path("/comments/abc123.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"kind": "Listing"}])))
        .mount(&mock_server)
        .await;

    let result = orchestrator_for(&mock_server)
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.comments.is_empty());
}

#[tokio::test]
async fn test_missing_heading_is_empty_not_error() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        200,
        "<html><body><p>No heading here</p></body></html>".to_string(),
    )
    .await;
    mount_listing(&mock_server, &[("c1", "first")]).await;

    let result = orchestrator_for(&mock_server)
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.heading, "");
    assert_eq!(result.comments.len(), 1);
}

#[tokio::test]
async fn test_url_without_post_id_is_format_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/test/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("Subreddit", None)))
        .mount(&mock_server)
        .await;

    let request = ScrapeRequest::new(format!("{}/r/test/", mock_server.uri())).unwrap();
    let err = orchestrator_for(&mock_server)
        .scrape(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Format(_)));
}

#[tokio::test]
async fn test_page_fetch_failure_is_fatal() {
    let orchestrator = Orchestrator::new(reqwest::Client::new(), UNREACHABLE);
    let request = ScrapeRequest::new(format!("{}/r/x/comments/abc123/t", UNREACHABLE)).unwrap();

    let err = orchestrator
        .scrape(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_error_status_without_challenge_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 404, "<html>not found</html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let sink = Arc::new(JsonFileSink::new(dir.path().join("scrape_results.json")));

    let err = orchestrator_for(&mock_server)
        .with_sink(sink.clone())
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(sink.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_page_is_fatal() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 200, String::new()).await;

    let err = orchestrator_for(&mock_server)
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::EmptyPage { .. }));
}

#[tokio::test]
async fn test_challenge_is_solved_before_extraction() {
    let page_server = MockServer::start().await;
    let solver_server = MockServer::start().await;

    mount_page(&page_server, 403, page_html("Blocked thread", Some("6Lc-site-key"))).await;
    mount_listing(&page_server, &[("c1", "first"), ("c2", "second")]).await;

    mount_create_task(&solver_server, "task-42").await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(ready_reply("resolved-token"))
        .expect(1)
        .mount(&solver_server)
        .await;

    let orchestrator = orchestrator_for(&page_server)
        .with_solver(Arc::new(solver_for(&solver_server.uri())));

    let result = orchestrator
        .scrape(&request_for(&page_server), &CancellationToken::new())
        .await
        .expect("challenged scrape should succeed");

    assert_eq!(result.challenge_site_key.as_deref(), Some("6Lc-site-key"));
    assert_eq!(result.heading, "Blocked thread");
    assert_eq!(result.comments.len(), 2);

    let create_calls = solver_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/createTask")
        .count();
    assert_eq!(create_calls, 1);
}

#[tokio::test]
async fn test_challenge_without_solver_is_configuration_error() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 200, page_html("Hello", Some("6Lc-site-key"))).await;

    let err = orchestrator_for(&mock_server)
        .scrape(&request_for(&mock_server), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Config(_)));
}

#[tokio::test]
async fn test_failed_challenge_is_fatal() {
    let page_server = MockServer::start().await;
    let solver_server = MockServer::start().await;

    mount_page(&page_server, 200, page_html("Hello", Some("6Lc-site-key"))).await;
    mount_listing(&page_server, &[("c1", "first")]).await;

    mount_create_task(&solver_server, "task-7").await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "status": "failed"})),
        )
        .mount(&solver_server)
        .await;

    let err = orchestrator_for(&page_server)
        .with_solver(Arc::new(solver_for(&solver_server.uri())))
        .scrape(&request_for(&page_server), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::ChallengeFailed { .. }));
}
