use crate::state::PanelPatch;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Messages the panel sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeRequest {
    PingContent,
    OpenPanel,
    GetState,
    SetState {
        #[serde(default)]
        patch: PanelPatch,
    },
    GetOpenFlag {
        #[serde(default, rename = "defaultVal")]
        default_val: bool,
    },
    SetOpenFlag {
        #[serde(default)]
        value: bool,
    },
    BackendFetch {
        path: String,
        #[serde(default)]
        body: Value,
    },
    StartAutomation {
        #[serde(default)]
        prompt: String,
    },
    Summarize {
        #[serde(default)]
        task: Option<String>,
    },
    RunBookmark {
        name: String,
    },
}

impl BridgeRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeRequest::PingContent => "PING_CONTENT",
            BridgeRequest::OpenPanel => "OPEN_PANEL",
            BridgeRequest::GetState => "GET_STATE",
            BridgeRequest::SetState { .. } => "SET_STATE",
            BridgeRequest::GetOpenFlag { .. } => "GET_OPEN_FLAG",
            BridgeRequest::SetOpenFlag { .. } => "SET_OPEN_FLAG",
            BridgeRequest::BackendFetch { .. } => "BACKEND_FETCH",
            BridgeRequest::StartAutomation { .. } => "START_AUTOMATION",
            BridgeRequest::Summarize { .. } => "SUMMARIZE",
            BridgeRequest::RunBookmark { .. } => "RUN_BOOKMARK",
        }
    }
}

/// `{ok: true, ...payload}` or `{ok: false, error}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl BridgeReply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_use_panel_wire_names() {
        let request: BridgeRequest =
            serde_json::from_value(json!({"type": "GET_OPEN_FLAG", "defaultVal": true})).unwrap();
        assert_eq!(request, BridgeRequest::GetOpenFlag { default_val: true });

        let request: BridgeRequest = serde_json::from_value(json!({
            "type": "SET_STATE",
            "patch": {"prompt": "p", "activeTab": "result"}
        }))
        .unwrap();
        match request {
            BridgeRequest::SetState { patch } => {
                assert_eq!(patch.prompt.as_deref(), Some("p"));
                assert!(patch.log_html.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        let json = serde_json::to_value(BridgeRequest::StartAutomation {
            prompt: "go".into(),
        })
        .unwrap();
        assert_eq!(json, json!({"type": "START_AUTOMATION", "prompt": "go"}));
        assert_eq!(BridgeRequest::PingContent.kind(), "PING_CONTENT");
    }

    #[test]
    fn unknown_types_do_not_parse() {
        assert!(serde_json::from_value::<BridgeRequest>(json!({"type": "SELF_DESTRUCT"})).is_err());
    }

    #[test]
    fn replies_flatten_their_payload() {
        let reply = BridgeReply::ok().with("value", true);
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"ok": true, "value": true}));
        assert_eq!(
            serde_json::to_value(BridgeReply::fail("empty prompt")).unwrap(),
            json!({"ok": false, "error": "empty prompt"})
        );
    }
}
