#![allow(dead_code)]

use policy_client::{PolicyAdmin, Settings};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PROJECT: &str = "proj";
pub const ENV: &str = "env";

pub fn admin_for(server: &MockServer) -> PolicyAdmin {
    PolicyAdmin::new(
        Settings::new(server.uri(), "test-key")
            .with_pdp_url(server.uri())
            .with_scope(PROJECT, ENV)
            .with_request_timeout(Duration::from_secs(2))
            .with_health_timeout(Duration::from_millis(500)),
    )
}

pub fn schema(suffix: &str) -> String {
    format!("/schema/{}/{}{}", PROJECT, ENV, suffix)
}

pub fn facts(suffix: &str) -> String {
    format!("/facts/{}/{}{}", PROJECT, ENV, suffix)
}

/// Mount a GET that answers with `body`.
pub async fn mount_list(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Requests received so far with the given method, in arrival order.
pub async fn requests_with_method(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb)
        .collect()
}

pub async fn paths_with_method(server: &MockServer, verb: &str) -> Vec<String> {
    requests_with_method(server, verb)
        .await
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
