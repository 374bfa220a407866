//! Authenticated HTTP transport for the administrative API.
//!
//! Every call is normalized into a [`CallResult`]: 2xx and 409 become
//! [`ApiReply`] (409 with `exists = true`), everything else becomes a
//! [`TransportError`]. Nothing here panics or propagates a raw
//! `reqwest::Error`.

use crate::config::Settings;
use crate::error::TransportError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Successful outcome of an administrative call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    /// Parsed JSON body. `None` for empty or non-JSON bodies.
    pub data: Option<Value>,
    /// The entity was already present (HTTP 409).
    pub exists: bool,
}

pub type CallResult = Result<ApiReply, TransportError>;

/// HTTP client bound to one set of [`Settings`].
pub struct TransportClient {
    http: Client,
    settings: Settings,
}

impl TransportClient {
    pub fn new(settings: Settings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Issue one request against the administrative API.
    ///
    /// `endpoint` is relative to the configured base URL. The whole exchange,
    /// including reading the body, is dropped once the request timeout elapses.
    pub async fn call(&self, method: Method, endpoint: &str, body: Option<&Value>) -> CallResult {
        let url = format!("{}{}", self.settings.api_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.settings.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(self.settings.request_timeout, exchange).await {
            Err(_) => {
                let err = TransportError::Timeout {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    timeout: self.settings.request_timeout,
                };
                error!("{}", err);
                Err(err)
            }
            Ok(Err(e)) => {
                let err = TransportError::Network {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                };
                error!("{}", err);
                Err(err)
            }
            Ok(Ok((status, text))) => classify(&method, endpoint, status, parse_body(&text)),
        }
    }

    pub async fn get(&self, endpoint: &str) -> CallResult {
        self.call(Method::GET, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> CallResult {
        self.call(Method::POST, endpoint, Some(body)).await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value) -> CallResult {
        self.call(Method::PATCH, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str, body: Option<&Value>) -> CallResult {
        self.call(Method::DELETE, endpoint, body).await
    }

    /// Probe the decision point's `/health` endpoint.
    ///
    /// Healthy when the response is 2xx or its body carries a `healthy`/`ok`
    /// token. Any failure, timeout included, yields `false`.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.settings.pdp_url);
        debug!("GET {}", url);

        let probe = async {
            let response = self.http.get(&url).send().await?;
            let ok = response.status().is_success();
            let body = response.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((ok, body))
        };

        match tokio::time::timeout(self.settings.health_timeout, probe).await {
            Ok(Ok((true, _))) => true,
            Ok(Ok((false, body))) => {
                let healthy = body_reports_healthy(&body);
                if !healthy {
                    warn!("Decision point at {} reports unhealthy", self.settings.pdp_url);
                }
                healthy
            }
            Ok(Err(e)) => {
                warn!("Decision point health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    "Decision point health check timed out after {:?}",
                    self.settings.health_timeout
                );
                false
            }
        }
    }
}

fn classify(method: &Method, endpoint: &str, status: StatusCode, data: Option<Value>) -> CallResult {
    let code = status.as_u16();

    if status.is_success() {
        return Ok(ApiReply {
            status: code,
            data,
            exists: false,
        });
    }

    if status == StatusCode::CONFLICT {
        debug!("{} {} -> 409, already exists", method, endpoint);
        return Ok(ApiReply {
            status: code,
            data,
            exists: true,
        });
    }

    if status == StatusCode::NOT_FOUND {
        debug!("{} {} -> 404", method, endpoint);
    } else {
        warn!("{} {} -> {}", method, endpoint, code);
    }

    Err(TransportError::Rejected { status: code, data })
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}

fn body_reports_healthy(body: &str) -> bool {
    body.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "healthy" || token == "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TransportClient {
        TransportClient::new(
            Settings::new(server.uri(), "test-key")
                .with_pdp_url(server.uri())
                .with_request_timeout(Duration::from_millis(300))
                .with_health_timeout(Duration::from_millis(300)),
        )
    }

    #[test]
    fn test_parse_body_tolerates_non_json() {
        assert_eq!(parse_body(""), None);
        assert_eq!(parse_body("<html>oops</html>"), None);
        assert_eq!(parse_body(r#"{"a":1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_health_keywords() {
        assert!(body_reports_healthy("OK"));
        assert!(body_reports_healthy(r#"{"status":"healthy"}"#));
        assert!(!body_reports_healthy(r#"{"status":"unhealthy"}"#));
        assert!(!body_reports_healthy("broken"));
    }

    #[tokio::test]
    async fn test_success_attaches_credential_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"key": "x"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "1"})))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .post("/things", &json!({"key": "x"}))
            .await
            .unwrap();
        assert_eq!(reply.status, 201);
        assert!(!reply.exists);
        assert_eq!(reply.data, Some(json!({"id": "1"})));
    }

    #[tokio::test]
    async fn test_conflict_is_success_with_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "dup"})))
            .mount(&server)
            .await;

        let reply = client_for(&server).post("/things", &json!({})).await.unwrap();
        assert_eq!(reply.status, 409);
        assert!(reply.exists);
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "bad"})))
            .mount(&server)
            .await;

        let err = client_for(&server).get("/things").await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.data(), Some(&json!({"message": "bad"})));
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let err = client_for(&server).get("/things").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.data().is_none());
    }

    #[tokio::test]
    async fn test_timeout_returns_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let err = client_for(&server).get("/slow").await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_network_error_returns_failure() {
        let client = TransportClient::new(
            Settings::new("http://127.0.0.1:1", "k").with_request_timeout(Duration::from_secs(2)),
        );
        let err = client.get("/things").await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. } | TransportError::Timeout { .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;
        assert!(client_for(&server).check_health().await);
    }

    #[tokio::test]
    async fn test_health_check_keyword_on_non_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;
        assert!(client_for(&server).check_health().await);
    }

    #[tokio::test]
    async fn test_health_check_failure_and_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;
        assert!(!client_for(&server).check_health().await);

        let offline = TransportClient::new(
            Settings::new("http://127.0.0.1:1", "k").with_pdp_url("http://127.0.0.1:1"),
        );
        assert!(!offline.check_health().await);
    }
}
