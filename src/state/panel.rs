use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelTab {
    #[default]
    Log,
    Result,
    Steps,
}

/// Presentation state of a tab's panel. Survives navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelState {
    pub open: bool,
    pub prompt: String,
    #[serde(rename = "logHTML")]
    pub log_html: String,
    #[serde(rename = "resultHTML")]
    pub result_html: String,
    #[serde(rename = "stepsJSON")]
    pub steps_json: String,
    pub bookmark: String,
    pub active_tab: PanelTab,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(rename = "logHTML", skip_serializing_if = "Option::is_none")]
    pub log_html: Option<String>,
    #[serde(rename = "resultHTML", skip_serializing_if = "Option::is_none")]
    pub result_html: Option<String>,
    #[serde(rename = "stepsJSON", skip_serializing_if = "Option::is_none")]
    pub steps_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<PanelTab>,
}

impl PanelState {
    pub fn apply(&mut self, patch: PanelPatch) {
        if let Some(open) = patch.open {
            self.open = open;
        }
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(log_html) = patch.log_html {
            self.log_html = log_html;
        }
        if let Some(result_html) = patch.result_html {
            self.result_html = result_html;
        }
        if let Some(steps_json) = patch.steps_json {
            self.steps_json = steps_json;
        }
        if let Some(bookmark) = patch.bookmark {
            self.bookmark = bookmark;
        }
        if let Some(active_tab) = patch.active_tab {
            self.active_tab = active_tab;
        }
    }

    pub fn append_log(&mut self, line_html: &str) {
        self.log_html.push_str(line_html);
    }
}
