use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an atomic action. Names are matched case-insensitively;
/// anything unrecognized is kept so it can fail at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Navigate,
    Click,
    Type,
    PressEnter,
    Scroll,
    WaitForText,
    Done,
    Other(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::PressEnter => "pressEnter",
            ActionKind::Scroll => "scroll",
            ActionKind::WaitForText => "waitForText",
            ActionKind::Done => "done",
            ActionKind::Other(name) => name,
        }
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "navigate" => ActionKind::Navigate,
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "pressenter" => ActionKind::PressEnter,
            "scroll" => ActionKind::Scroll,
            "waitfortext" => ActionKind::WaitForText,
            "done" => ActionKind::Done,
            _ => ActionKind::Other(name),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

impl From<String> for ScrollDirection {
    fn from(raw: String) -> Self {
        if raw.trim().eq_ignore_ascii_case("up") {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        }
    }
}

impl From<ScrollDirection> for String {
    fn from(direction: ScrollDirection) -> Self {
        match direction {
            ScrollDirection::Up => "up".to_string(),
            ScrollDirection::Down => "down".to_string(),
        }
    }
}

/// Semantic target: an ARIA-ish role plus an accessible name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub role: String,
    pub name: String,
}

impl Query {
    pub fn new(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
        }
    }
}

/// One planner-issued instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScrollDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<u32>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Step {
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            selector: None,
            query: None,
            text: None,
            url: None,
            enter: None,
            direction: None,
            times: None,
            timeout: None,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(ActionKind::Navigate)
        }
    }

    pub fn click_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::new(ActionKind::Click)
        }
    }

    pub fn click_query(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            query: Some(Query::new(role, name)),
            ..Self::new(ActionKind::Click)
        }
    }

    pub fn type_query(role: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            query: Some(Query::new(role, name)),
            text: Some(text.into()),
            ..Self::new(ActionKind::Type)
        }
    }

    pub fn press_enter() -> Self {
        Self::new(ActionKind::PressEnter)
    }

    pub fn scroll(direction: ScrollDirection, times: u32) -> Self {
        Self {
            direction: Some(direction),
            times: Some(times),
            ..Self::new(ActionKind::Scroll)
        }
    }

    pub fn wait_for_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(ActionKind::WaitForText)
        }
    }

    pub fn done() -> Self {
        Self::new(ActionKind::Done)
    }

    pub fn with_enter(mut self, enter: bool) -> Self {
        self.enter = Some(enter);
        self
    }

    pub fn is_done(&self) -> bool {
        self.action == ActionKind::Done
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self
            .query
            .as_ref()
            .map(|q| {
                let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
                format!(" {{role:{}, name:{}}}", or_dash(&q.role), or_dash(&q.name))
            })
            .unwrap_or_default();
        let text = self
            .text
            .as_deref()
            .map(|t| format!(" \"{}\"", t))
            .unwrap_or_default();
        match self.action {
            ActionKind::Type => write!(f, "type{}{}", text, query),
            ActionKind::Click => match (&self.selector, &self.query) {
                (Some(selector), None) => write!(f, "click {}", selector),
                _ => write!(f, "click{}", query),
            },
            ActionKind::Navigate => write!(f, "navigate to {}", self.url.as_deref().unwrap_or("")),
            ActionKind::PressEnter => f.write_str("press Enter"),
            ActionKind::WaitForText => write!(f, "waitForText{}", text),
            ActionKind::Scroll => write!(
                f,
                "scroll {}",
                String::from(self.direction.unwrap_or_default())
            ),
            ActionKind::Done => f.write_str("done"),
            ActionKind::Other(ref name) => f.write_str(name),
        }
    }
}
