use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BackendError, Result};
use crate::types::{AnalysisReport, DeepReport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DEEP_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_LOGGED_ERROR_BYTES: usize = 500;

/// Client for the analysis backend. One outbound call per operation, no retries.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    deep_timeout: Duration,
    max_response_bytes: usize,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("deep_timeout", &self.deep_timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

impl BackendClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(DEFAULT_CONNECT_TIMEOUT),
            base_url,
            timeout: DEFAULT_TIMEOUT,
            deep_timeout: DEFAULT_DEEP_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_deep_timeout(mut self, timeout: Duration) -> Self {
        self.deep_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_response_bytes(mut self, bytes: usize) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run the basic Four Pillars analysis.
    ///
    /// `request` is sent as the JSON body unchanged, typically an
    /// [`AnalyzeRequest`](crate::AnalyzeRequest) or a caller-supplied JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Upstream`] on a non-success status, [`BackendError::Timeout`]
    /// when the backend is too slow, and [`BackendError::Schema`] when the body does not
    /// match [`AnalysisReport`].
    pub async fn analyze<B>(&self, request: &B) -> Result<AnalysisReport>
    where
        B: Serialize + ?Sized,
    {
        self.post_json("/analyze", request, self.timeout).await
    }

    /// Generate the paid deep report.
    ///
    /// Uses the longer deep-analysis allowance; exceeding it yields
    /// [`BackendError::Timeout`] with no partial result.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::analyze`].
    pub async fn analyze_deep<B>(&self, request: &B) -> Result<DeepReport>
    where
        B: Serialize + ?Sized,
    {
        self.post_json("/analyze/deep", request, self.deep_timeout).await
    }

    /// Probe the backend root endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with a non-success status.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, self.timeout))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Upstream {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    async fn post_json<T, B>(&self, path: &str, body: &B, timeout: Duration) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "forwarding request to backend");

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let mut text = resp.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut text, MAX_LOGGED_ERROR_BYTES);
            tracing::error!("backend error {status} on {path}: {text}");
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        if let Some(len) = resp.content_length() {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            if len > self.max_response_bytes {
                return Err(BackendError::BodyTooLarge(len));
            }
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BackendError::from_transport(e, timeout))?;
        if bytes.len() > self.max_response_bytes {
            return Err(BackendError::BodyTooLarge(bytes.len()));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!("backend response on {path} failed schema validation: {e}");
            BackendError::Schema(e)
        })
    }
}

fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::AnalyzeRequest;

    fn analysis_body() -> serde_json::Value {
        json!({
            "class": "Druid",
            "class_description": "A keeper of growing things.",
            "dominant_element": "Wood",
            "day_master": "Fire",
            "stats": {"Wood": 3, "Fire": 2, "Earth": 1, "Metal": 1, "Water": 1},
            "pillars": {
                "year": {"stem": "Yang Metal (庚)", "branch": "Horse (午)"},
                "month": {"stem": "Yin Water (癸)", "branch": "Ox (丑)"},
                "day": {"stem": "Yang Fire (丙)", "branch": "Tiger (寅)"},
                "hour": {"stem": "Yang Wood (甲)", "branch": "Rabbit (卯)"}
            },
            "interpretations": {"personality": "Warm."},
            "detailed_report": "## 1. Essence & Personality\nWarm."
        })
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest::new("1990-01-15").with_birth_time("09:00")
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let client = BackendClient::new("http://backend:8000//");
        assert_eq!(client.base_url(), "http://backend:8000");
    }

    #[test]
    fn debug_hides_client_internals() {
        let client = BackendClient::new("http://backend:8000");
        let debug = format!("{client:?}");
        assert!(debug.contains("http://backend:8000"));
        assert!(debug.contains("<reqwest::Client>"));
    }

    #[test]
    fn truncate_respects_utf8() {
        let mut s = "운명".repeat(10);
        truncate_at_char_boundary(&mut s, 4);
        assert_eq!(s, "운");
    }

    #[tokio::test]
    async fn analyze_posts_body_and_parses_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(json!({"birthDate": "1990-01-15", "birthTime": "09:00"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let report = client.analyze(&request()).await.unwrap();
        assert_eq!(report.class, "Druid");
        assert_eq!(report.pillars.hour.branch, "Rabbit (卯)");
    }

    #[tokio::test]
    async fn analyze_forwards_untyped_body_as_is() {
        let body = json!({"birthDate": 19_900_115, "birthTime": 930, "locale": "ko"});
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let report = client.analyze(&body).await.unwrap();
        assert_eq!(report.dominant_element, "Wood");
    }

    #[tokio::test]
    async fn analyze_upstream_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.analyze(&request()).await.unwrap_err();
        match err {
            BackendError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_schema_drift_is_rejected() {
        let server = MockServer::start().await;
        let mut body = analysis_body();
        body.as_object_mut().unwrap().remove("stats");
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Schema(_)));
    }

    #[tokio::test]
    async fn analyze_non_json_body_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let err = client.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Schema(_)));
    }

    #[tokio::test]
    async fn deep_report_text_is_unchanged() {
        let server = MockServer::start().await;
        let report = "## The Essence of the Soul\n> \"天道有自然之理\"\n\n## Sage's Final Wisdom\nBreathe.";
        Mock::given(method("POST"))
            .and(path("/analyze/deep"))
            .and(body_json(json!({
                "birthDate": "1990-01-15",
                "birthTime": "09:00",
                "paymentId": "PAYID-1"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "deep_report": report })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let deep = client
            .analyze_deep(&request().with_payment_id("PAYID-1"))
            .await
            .unwrap();
        assert_eq!(deep.deep_report, report);
    }

    #[tokio::test]
    async fn deep_timeout_yields_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/deep"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"deep_report": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            BackendClient::new(server.uri()).with_deep_timeout(Duration::from_millis(50));
        let err = client.analyze_deep(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/deep"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"deep_report": "x".repeat(2_048)})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).with_max_response_bytes(1_024);
        let err = client.analyze_deep(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::BodyTooLarge(n) if n > 1_024));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        // nothing listens on the discard port
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Http(_) | BackendError::Timeout(_)));
        assert_eq!(err.upstream_status(), None);
    }

    #[tokio::test]
    async fn health_ok_and_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        client.health().await.unwrap();

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&down)
            .await;
        let client = BackendClient::new(down.uri());
        let err = client.health().await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(502));
    }
}
