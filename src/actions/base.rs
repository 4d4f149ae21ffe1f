use crate::actions::{ActionKind, Step};
use crate::core::{AutomationConfig, PageTrait};
use crate::dom::ElementResolver;
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pause between the Enter key sequence and the form submission attempt.
pub const ENTER_SUBMIT_PAUSE: Duration = Duration::from_millis(50);

/// Result of executing one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub did_navigate: bool,
    #[serde(default)]
    pub done: bool,
}

impl ActionOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn navigated() -> Self {
        Self {
            did_navigate: true,
            ..Self::success()
        }
    }

    pub fn finished() -> Self {
        Self {
            done: true,
            ..Self::success()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Per-step failures. The Display strings are the error codes reported to
/// the loop and the panel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("target-not-found")]
    TargetNotFound,

    #[error("missing-url")]
    MissingUrl,

    #[error("missing-text")]
    MissingText,

    #[error("timeout")]
    Timeout,

    #[error("unknown-action:{0}")]
    UnknownAction(String),

    #[error("{0}")]
    Execution(String),
}

/// One executable action kind
#[async_trait]
pub trait Action: Send + Sync {
    /// The kind this action handles
    fn kind(&self) -> ActionKind;

    /// Description of what the action does
    fn description(&self) -> &str;

    /// Checks the step's fields before anything touches the page
    fn validate(&self, _step: &Step) -> std::result::Result<(), ActionError> {
        Ok(())
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> Result<ActionOutcome>;
}

/// Timing knobs the actions read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTiming {
    pub poll_interval: Duration,
    pub wait_for_text_timeout: Duration,
    pub scroll_step_px: i64,
    pub scroll_pause: Duration,
}

impl Default for ActionTiming {
    fn default() -> Self {
        Self::from(&AutomationConfig::default())
    }
}

impl From<&AutomationConfig> for ActionTiming {
    fn from(config: &AutomationConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            wait_for_text_timeout: Duration::from_millis(config.wait_for_text_timeout_ms),
            scroll_step_px: config.scroll_step_px,
            scroll_pause: Duration::from_millis(config.scroll_pause_ms),
        }
    }
}

/// Context provided to actions during execution
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// The run's natural-language goal
    pub prompt: String,
    pub timing: ActionTiming,
    pub resolver: ElementResolver,
}

impl ActionContext {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_timing(mut self, timing: ActionTiming) -> Self {
        self.timing = timing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ActionError::TargetNotFound.to_string(), "target-not-found");
        assert_eq!(ActionError::MissingUrl.to_string(), "missing-url");
        assert_eq!(ActionError::MissingText.to_string(), "missing-text");
        assert_eq!(ActionError::Timeout.to_string(), "timeout");
        assert_eq!(
            ActionError::UnknownAction("hover".into()).to_string(),
            "unknown-action:hover"
        );
    }

    #[test]
    fn timing_follows_config() {
        let config = AutomationConfig {
            poll_interval_ms: 100,
            scroll_step_px: 300,
            ..Default::default()
        };
        let timing = ActionTiming::from(&config);
        assert_eq!(timing.poll_interval, Duration::from_millis(100));
        assert_eq!(timing.scroll_step_px, 300);
        assert_eq!(timing.wait_for_text_timeout, Duration::from_millis(8000));
    }
}
