use crate::common::{
    fast_policy, listing, mount_create_task, page_html, pending_reply, solver_for,
};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use threadgrab::pipeline::Orchestrator;
use threadgrab::server::router;
use threadgrab::ScrapeResult;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

async fn call(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_scrape_endpoint_returns_result_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/test/comments/abc123/hello/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("Hello", None)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/comments/abc123.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(listing(&[("c1", "first"), ("c2", "second"), ("c3", "third")])),
        )
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(
        reqwest::Client::new(),
        &format!("{}/comments", mock_server.uri()),
    );
    let app = router(Arc::new(orchestrator));

    let target = format!("{}/r/test/comments/abc123/hello/", mock_server.uri());
    let (status, body) = call(app, &format!("/scrape?url={}", encode(&target))).await;

    assert_eq!(status, StatusCode::OK);

    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["h1"], "Hello");
    assert_eq!(value["url"], target.as_str());
    assert_eq!(value["comments"][0]["comment_id"], "c1");
    assert!(value["time"].is_string());

    let result: ScrapeResult = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.comments.len(), 2);
}

#[tokio::test]
async fn test_scrape_endpoint_rejects_url_without_post_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("About", None)))
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(reqwest::Client::new(), &mock_server.uri());
    let app = router(Arc::new(orchestrator));

    let target = format!("{}/about", mock_server.uri());
    let (status, body) = call(app, &format!("/scrape?url={}", encode(&target))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("could not extract post ID"));
}

#[tokio::test]
async fn test_scrape_endpoint_maps_unreachable_target_to_bad_gateway() {
    let orchestrator = Orchestrator::new(reqwest::Client::new(), "http://127.0.0.1:1");
    let app = router(Arc::new(orchestrator));

    let target = "http://127.0.0.1:1/r/x/comments/abc123/t";
    let (status, _) = call(app, &format!("/scrape?url={}", encode(target))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

async fn poll_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/getTaskResult")
        .count()
}

#[tokio::test]
async fn test_client_disconnect_stops_challenge_polling() {
    let page_server = MockServer::start().await;
    let solver_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/test/comments/abc123/hello/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(page_html("Hello", Some("6Lc-site-key"))),
        )
        .mount(&page_server)
        .await;

    mount_create_task(&solver_server, "task-slow").await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(pending_reply())
        .mount(&solver_server)
        .await;

    let solver =
        solver_for(&solver_server.uri()).with_policy(fast_policy(Duration::from_secs(30)));
    let orchestrator = Orchestrator::new(
        reqwest::Client::new(),
        &format!("{}/comments", page_server.uri()),
    )
    .with_solver(Arc::new(solver));
    let app = router(Arc::new(orchestrator));

    let target = format!("{}/r/test/comments/abc123/hello/", page_server.uri());
    let request = Request::builder()
        .uri(format!("/scrape?url={}", encode(&target)))
        .body(Body::empty())
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(300), app.oneshot(request)).await;
    assert!(outcome.is_err(), "request should still be waiting on the challenge");

    tokio::time::sleep(Duration::from_millis(50)).await;
    let polls_at_disconnect = poll_count(&solver_server).await;
    assert!(polls_at_disconnect > 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(poll_count(&solver_server).await, polls_at_disconnect);
}
