use serde_json::{json, Value};
use std::time::Duration;
use threadgrab::challenge::{CapSolverClient, PollPolicy};
use threadgrab::config::SolverConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast polling limits so tests finish in milliseconds
pub fn fast_policy(timeout: Duration) -> PollPolicy {
    PollPolicy {
        poll_interval: Duration::from_millis(10),
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
        backoff_multiplier: 2.0,
        timeout,
        max_protocol_errors: 3,
    }
}

/// Creates a solver pointed at the given API base
pub fn solver_for(api_base: &str) -> CapSolverClient {
    let config = SolverConfig {
        api_base: api_base.to_string(),
        client_key: Some("CAP-TEST-KEY".to_string()),
        ..SolverConfig::default()
    };
    CapSolverClient::new(&config, reqwest::Client::new())
        .expect("solver should build with a key")
        .with_policy(fast_policy(Duration::from_secs(2)))
}

/// Page markup with a slotted title and optional challenge container
pub fn page_html(heading: &str, site_key: Option<&str>) -> String {
    let challenge = site_key
        .map(|key| format!(r#"<div class="g-recaptcha" data-sitekey="{}"></div>"#, key))
        .unwrap_or_default();
    format!(
        "<html>\n<head><title>{heading}</title></head>\n<body>\n<shreddit-post>\n<h1 slot=\"title\">{heading}</h1>\n</shreddit-post>\n{challenge}\n</body>\n</html>\n"
    )
}

/// Comment listing document with the given (id, body) children
pub fn listing(children: &[(&str, &str)]) -> Value {
    let children: Vec<Value> = children
        .iter()
        .map(|(id, body)| json!({"kind": "t1", "data": {"id": id, "body": body}}))
        .collect();
    json!([
        {"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {"id": "abc123"}}]}},
        {"kind": "Listing", "data": {"children": children}}
    ])
}

/// Mounts a createTask mock returning the given task ID
pub async fn mount_create_task(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errorId": 0, "taskId": task_id, "status": "idle"})),
        )
        .mount(server)
        .await;
}

pub fn ready_reply(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "errorId": 0,
        "status": "ready",
        "solution": {"gRecaptchaResponse": token}
    }))
}

pub fn pending_reply() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "status": "processing"}))
}

/// A base URL nothing listens on
pub const UNREACHABLE: &str = "http://127.0.0.1:1";
