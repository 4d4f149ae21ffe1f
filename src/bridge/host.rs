use crate::bridge::{BridgeEnvelope, BridgeReply, BridgeRequest};
use crate::dom::{summary_context, SnapshotProducer};
use crate::orchestrator::{EventRecorder, Orchestrator, RunReport};
use crate::planner::{PlanningClient, SummarizeRequest};
use crate::state::PanelPatch;
use crate::types::TabId;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_SUMMARY_TASK: &str = "Summarize this page";

/// Answers panel requests: panel state, backend passthrough, summaries and
/// starting automation runs.
///
/// Automation events are mirrored into the panel state for as long as the
/// host lives, so a remounted panel can restore its log from `GET_STATE`.
pub struct BackgroundHost {
    orchestrator: Arc<Orchestrator>,
    client: PlanningClient,
    snapshots: SnapshotProducer,
    recorder: JoinHandle<()>,
}

impl BackgroundHost {
    /// Must be called inside a tokio runtime.
    pub fn new(orchestrator: Arc<Orchestrator>, client: PlanningClient) -> Arc<Self> {
        let recorder =
            EventRecorder::spawn(Arc::clone(orchestrator.store()), orchestrator.subscribe());
        Arc::new(Self {
            snapshots: SnapshotProducer::new(orchestrator.config().max_links),
            orchestrator,
            client,
            recorder,
        })
    }

    /// Serves envelopes until every client is gone. Each request is handled
    /// on its own task so a slow backend call does not hold up the panel.
    pub fn serve(self: Arc<Self>, mut rx: mpsc::Receiver<BridgeEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let host = Arc::clone(&self);
                tokio::spawn(async move {
                    let reply = host.handle(&envelope.tab, envelope.request.clone()).await;
                    envelope.respond(reply);
                });
            }
            debug!("bridge host stopped");
        })
    }

    pub async fn handle(&self, tab: &TabId, request: BridgeRequest) -> BridgeReply {
        let store = self.orchestrator.store();
        match request {
            BridgeRequest::PingContent => BridgeReply::ok(),
            BridgeRequest::OpenPanel => {
                store.set_open_flag(tab, true);
                BridgeReply::ok()
            }
            BridgeRequest::GetState => {
                match serde_json::to_value(store.panel(tab).unwrap_or_default()) {
                    Ok(state) => BridgeReply::ok().with("state", state),
                    Err(e) => BridgeReply::fail(e.to_string()),
                }
            }
            BridgeRequest::SetState { patch } => {
                store.patch_panel(tab, patch);
                BridgeReply::ok()
            }
            BridgeRequest::GetOpenFlag { default_val } => {
                BridgeReply::ok().with("value", store.open_flag(tab, default_val))
            }
            BridgeRequest::SetOpenFlag { value } => {
                store.set_open_flag(tab, value);
                BridgeReply::ok()
            }
            BridgeRequest::BackendFetch { path, body } => {
                let body = if body.is_null() {
                    Value::Object(Default::default())
                } else {
                    body
                };
                match self.client.post_json(&path, &body).await {
                    Ok(data) => BridgeReply::ok().with("data", data),
                    Err(e) => BridgeReply::fail(e.to_string()),
                }
            }
            BridgeRequest::StartAutomation { prompt } => self.start_automation(tab, &prompt),
            BridgeRequest::Summarize { task } => self.summarize(tab, task).await,
            BridgeRequest::RunBookmark { name } => match self.client.run_bookmark(&name).await {
                Ok(data) => BridgeReply::ok().with("data", data),
                Err(e) => BridgeReply::fail(e.to_string()),
            },
        }
    }

    fn start_automation(&self, tab: &TabId, prompt: &str) -> BridgeReply {
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            return BridgeReply::fail("empty prompt");
        }
        let Some(guard) = self.orchestrator.reserve(tab, &prompt) else {
            debug!(tab = %tab, "run already active, ignoring start");
            return BridgeReply::ok().with("started", false);
        };

        self.orchestrator.store().patch_panel(
            tab,
            PanelPatch {
                open: Some(true),
                prompt: Some(prompt.clone()),
                ..Default::default()
            },
        );

        let orchestrator = Arc::clone(&self.orchestrator);
        let tab = tab.clone();
        info!(tab = %tab, prompt = %prompt, "starting automation");
        tokio::spawn(async move {
            match orchestrator.run_reserved(guard, &prompt).await {
                RunReport::Finished(summary) => {
                    debug!(tab = %tab, actions = summary.actions_taken, "background run finished")
                }
                RunReport::NotStarted { failure } => {
                    warn!(tab = %tab, %failure, "background run did not start")
                }
                RunReport::AlreadyRunning => debug!(tab = %tab, "background run already active"),
            }
        });
        BridgeReply::ok().with("started", true)
    }

    async fn summarize(&self, tab: &TabId, task: Option<String>) -> BridgeReply {
        let Some(page) = self.orchestrator.tabs().get(tab) else {
            return BridgeReply::fail(format!("no such tab: {}", tab));
        };
        let context = match summary_context(page.as_ref(), &self.snapshots).await {
            Ok(context) => context,
            Err(e) => return BridgeReply::fail(e.to_string()),
        };
        let task = task
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY_TASK.to_string());

        match self.client.summarize(&SummarizeRequest { task, context }).await {
            Ok(summary) => BridgeReply::ok().with("summary", summary),
            Err(e) => BridgeReply::fail(e.to_string()),
        }
    }
}

impl Drop for BackgroundHost {
    fn drop(&mut self) {
        self.recorder.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{channel, DEFAULT_REPLY_TIMEOUT};
    use crate::browser::TabRegistry;
    use crate::core::{AutomationConfig, PlannerConfig};
    use crate::state::TabStateStore;
    use crate::testing::{FakePage, ScriptedPlanner};
    use crate::actions::Step;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head><title>Shop</title></head><body>
        <main><h1>Deals</h1><p>Cheap tea.</p></main>
        <a id="a" href="/a">A</a></body></html>"#;

    fn host_with(base_url: &str, planner: ScriptedPlanner) -> (Arc<BackgroundHost>, Arc<FakePage>) {
        let store = TabStateStore::new();
        let tabs = TabRegistry::new();
        let page = Arc::new(FakePage::new("https://shop.test/", PAGE));
        tabs.insert(TabId::from("1"), page.clone());
        let orchestrator = Arc::new(Orchestrator::new(
            store,
            tabs,
            Arc::new(planner),
            AutomationConfig::default(),
        ));
        let client = PlanningClient::new(&PlannerConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: Some(2_000),
        })
        .unwrap();
        (BackgroundHost::new(orchestrator, client), page)
    }

    fn offline_host() -> Arc<BackgroundHost> {
        host_with("http://127.0.0.1:9", ScriptedPlanner::new()).0
    }

    #[tokio::test]
    async fn panel_state_round_trips() {
        let host = offline_host();
        let tab = TabId::from("1");

        let reply = host.handle(&tab, BridgeRequest::GetOpenFlag { default_val: true }).await;
        assert_eq!(reply.get("value"), Some(&json!(true)));

        host.handle(&tab, BridgeRequest::SetOpenFlag { value: false }).await;
        let reply = host.handle(&tab, BridgeRequest::GetOpenFlag { default_val: true }).await;
        assert_eq!(reply.get("value"), Some(&json!(false)));

        let patch: PanelPatch = serde_json::from_value(json!({"logHTML": "<div>hi</div>"})).unwrap();
        assert!(host.handle(&tab, BridgeRequest::SetState { patch }).await.ok);
        let reply = host.handle(&tab, BridgeRequest::GetState).await;
        let state = reply.get("state").unwrap();
        assert_eq!(state["logHTML"], "<div>hi</div>");
        assert_eq!(state["open"], false);

        host.handle(&tab, BridgeRequest::OpenPanel).await;
        let reply = host.handle(&tab, BridgeRequest::GetOpenFlag { default_val: false }).await;
        assert_eq!(reply.get("value"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let reply = offline_host()
            .handle(&TabId::from("1"), BridgeRequest::StartAutomation { prompt: "  ".into() })
            .await;
        assert_eq!(reply, BridgeReply::fail("empty prompt"));
    }

    #[tokio::test(start_paused = true)]
    async fn start_automation_runs_in_the_background() {
        let planner = ScriptedPlanner::new().with_plan(vec![Step::click_selector("#a")]);
        let (host, page) = host_with("http://127.0.0.1:9", planner);
        let tab = TabId::from("1");
        let store = Arc::clone(host.orchestrator.store());

        let reply = host
            .handle(&tab, BridgeRequest::StartAutomation { prompt: " click a ".into() })
            .await;
        assert_eq!(reply.get("started"), Some(&json!(true)));
        let panel = store.panel(&tab).unwrap();
        assert!(panel.open);
        assert_eq!(panel.prompt, "click a");

        while page.clicks().is_empty() || store.is_running(&tab) {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        assert_eq!(page.clicks(), vec!["#a"]);

        // Let the recorder drain the last events.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let reply = host.handle(&tab, BridgeRequest::GetState).await;
        let state = reply.get("state").unwrap();
        let log = state["logHTML"].as_str().unwrap();
        assert!(log.contains("Automation: click a"), "{}", log);
        assert!(state["stepsJSON"].as_str().unwrap().contains("#a"));
        assert!(state["resultHTML"].as_str().unwrap().contains("Finished after 1 action(s)"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_refused_while_the_first_is_reserved() {
        let planner = ScriptedPlanner::new().with_plan(vec![Step::click_selector("#a")]);
        let (host, page) = host_with("http://127.0.0.1:9", planner);
        let tab = TabId::from("1");

        let first = host
            .handle(&tab, BridgeRequest::StartAutomation { prompt: "click a".into() })
            .await;
        let second = host
            .handle(&tab, BridgeRequest::StartAutomation { prompt: "click a".into() })
            .await;
        assert_eq!(first.get("started"), Some(&json!(true)));
        assert_eq!(second.get("started"), Some(&json!(false)));

        let store = Arc::clone(host.orchestrator.store());
        while store.is_running(&tab) {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        assert_eq!(page.clicks(), vec!["#a"]);
    }

    #[tokio::test]
    async fn backend_fetch_passes_through() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/echo"))
            .and(matchers::body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hello": "world"})))
            .mount(&server)
            .await;
        Mock::given(matchers::path("/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("later"))
            .mount(&server)
            .await;

        let (host, _) = host_with(&server.uri(), ScriptedPlanner::new());
        let tab = TabId::from("1");
        let reply = host
            .handle(
                &tab,
                BridgeRequest::BackendFetch {
                    path: "/echo".into(),
                    body: Value::Null,
                },
            )
            .await;
        assert_eq!(reply.get("data"), Some(&json!({"hello": "world"})));

        let reply = host
            .handle(
                &tab,
                BridgeRequest::BackendFetch {
                    path: "/broken".into(),
                    body: json!({}),
                },
            )
            .await;
        assert!(!reply.ok);
        assert!(reply.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn summarize_sends_the_page_context() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/summarize"))
            .and(matchers::body_partial_json(json!({
                "task": "Summarize this page",
                "context": {"url": "https://shop.test/", "title": "Shop", "headings": ["Deals"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Tea is cheap."})))
            .expect(1)
            .mount(&server)
            .await;

        let (host, _) = host_with(&server.uri(), ScriptedPlanner::new());
        let reply = host
            .handle(&TabId::from("1"), BridgeRequest::Summarize { task: Some(" ".into()) })
            .await;
        assert_eq!(reply.get("summary"), Some(&json!("Tea is cheap.")));

        let reply = host
            .handle(&TabId::from("404"), BridgeRequest::Summarize { task: None })
            .await;
        assert!(!reply.ok);
    }

    #[tokio::test]
    async fn served_over_the_channel() {
        let host = offline_host();
        let (client, rx) = channel(DEFAULT_REPLY_TIMEOUT);
        let server = host.serve(rx);

        let reply = client.request(&TabId::from("1"), BridgeRequest::PingContent).await.unwrap();
        assert!(reply.ok);
        drop(client);
        server.await.unwrap();
    }
}
