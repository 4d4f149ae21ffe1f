use crate::actions::Step;
use crate::core::PlannerConfig;
use crate::planner::{
    ExploreRequest, NextRequest, PlanRequest, Planner, PlannerError, RunBookmarkRequest,
    StepsResponse, SummarizeRequest, SummaryResponse,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// JSON-over-HTTP client for the planning service
#[derive(Debug, Clone)]
pub struct PlanningClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlanningClient {
    pub fn new(config: &PlannerConfig) -> Result<Self, PlannerError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        Self::with_client(builder.build()?, &config.base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, PlannerError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| PlannerError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PlannerError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` and returns the raw response text of a 2xx reply.
    async fn send<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<String, PlannerError> {
        let url = self.endpoint(path);
        debug!(%url, "planner request");
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = match serde_json::from_str::<Value>(&text) {
                Ok(json) => json.to_string(),
                Err(_) => text,
            };
            return Err(PlannerError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(text)
    }

    /// POSTs `body` to `path` and decodes the JSON reply. An empty reply is `null`.
    pub async fn post_json<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<Value, PlannerError> {
        let text = self.send(path, body).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(PlannerError::Decode)
    }

    async fn post_steps<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<Vec<Step>, PlannerError> {
        let value = self.post_json(path, body).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let response: StepsResponse = serde_json::from_value(value).map_err(PlannerError::Decode)?;
        Ok(response.steps)
    }

    pub async fn summarize(&self, request: &SummarizeRequest) -> Result<String, PlannerError> {
        let value = self.post_json("/summarize", request).await?;
        if value.is_null() {
            return Ok(String::new());
        }
        let response: SummaryResponse = serde_json::from_value(value).map_err(PlannerError::Decode)?;
        Ok(response.summary)
    }

    pub async fn run_bookmark(&self, name: &str) -> Result<Value, PlannerError> {
        let request = RunBookmarkRequest {
            name: name.to_string(),
        };
        self.post_json("/run_bookmark", &request).await
    }
}

#[async_trait]
impl Planner for PlanningClient {
    async fn plan(&self, request: &PlanRequest) -> Result<Vec<Step>, PlannerError> {
        self.post_steps("/plan", request).await
    }

    async fn next(&self, request: &NextRequest) -> Result<Vec<Step>, PlannerError> {
        self.post_steps("/next", request).await
    }

    async fn explore(&self, request: &ExploreRequest) -> Result<(), PlannerError> {
        self.send("/explore", request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use crate::planner::SummaryContext;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PlanningClient {
        PlanningClient::new(&PlannerConfig {
            base_url: format!("{}/", server.uri()),
            request_timeout_ms: Some(2000),
        })
        .unwrap()
    }

    fn plan_request() -> PlanRequest {
        PlanRequest {
            prompt: "search for cricket news".into(),
            dom: Vec::new(),
            start_url: "https://example.com/".into(),
        }
    }

    #[test]
    fn rejects_unusable_base_urls() {
        for bad in ["not a url", "ftp://planner.local"] {
            let err = PlanningClient::with_client(reqwest::Client::new(), bad).unwrap_err();
            assert!(matches!(err, PlannerError::InvalidBaseUrl(_)), "{}", bad);
        }
    }

    #[tokio::test]
    async fn plan_posts_request_and_parses_steps() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/plan"))
            .and(matchers::body_json(json!({
                "prompt": "search for cricket news",
                "dom": [],
                "start_url": "https://example.com/"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "steps": [{"action": "type", "query": {"role": "textbox", "name": "Search"},
                           "text": "cricket news", "enter": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let steps = client(&server).plan(&plan_request()).await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].action, ActionKind::Type);
        assert_eq!(steps[0].enter, Some(true));
    }

    #[tokio::test]
    async fn null_steps_and_empty_body_mean_no_steps() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/plan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"steps": null})))
            .mount(&server)
            .await;
        Mock::given(matchers::path("/next"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.plan(&plan_request()).await.unwrap().is_empty());
        let next = NextRequest {
            last_step: Step::done(),
            dom: Vec::new(),
            current_url: "https://example.com/".into(),
            prompt: "p".into(),
        };
        assert!(client.next(&next).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_success_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/plan"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"detail": "boom"}"#))
            .mount(&server)
            .await;
        Mock::given(matchers::path("/next"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client(&server);
        match client.plan(&plan_request()).await.unwrap_err() {
            PlannerError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"detail":"boom"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }

        let next = NextRequest {
            last_step: Step::done(),
            dom: Vec::new(),
            current_url: String::new(),
            prompt: String::new(),
        };
        let err = client.next(&next).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/plan"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client(&server).plan(&plan_request()).await.unwrap_err();
        assert!(matches!(err, PlannerError::Decode(_)));
    }

    #[tokio::test]
    async fn explore_ignores_the_reply_body() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/explore"))
            .and(matchers::body_json(json!({
                "current_url": "https://example.com/",
                "links": ["https://example.com/a"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ExploreRequest {
            current_url: "https://example.com/".into(),
            links: vec!["https://example.com/a".into()],
        };
        client(&server).explore(&request).await.unwrap();
    }

    #[tokio::test]
    async fn summarize_and_bookmarks() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/summarize"))
            .and(matchers::body_partial_json(json!({"task": "tl;dr"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Short."})))
            .mount(&server)
            .await;
        Mock::given(matchers::path("/run_bookmark"))
            .and(matchers::body_json(json!({"name": "daily"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "ran": 3})))
            .mount(&server)
            .await;

        let client = client(&server);
        let summary = client
            .summarize(&SummarizeRequest {
                task: "tl;dr".into(),
                context: SummaryContext::default(),
            })
            .await
            .unwrap();
        assert_eq!(summary, "Short.");

        let reply = client.run_bookmark("daily").await.unwrap();
        assert_eq!(reply["ran"], 3);
    }
}
