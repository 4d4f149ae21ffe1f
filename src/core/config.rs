use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{AgentError, Result};

pub const PLANNER_URL_ENV: &str = "COMMET_PLANNER_URL";
pub const MAX_ACTIONS_ENV: &str = "COMMET_MAX_ACTIONS";
pub const LOG_LEVEL_ENV: &str = "COMMET_LOG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub planner: PlannerConfig,
    pub automation: AutomationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
    /// Upper bound for a single script evaluation in the page.
    pub script_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub base_url: String,
    pub request_timeout_ms: Option<u64>,
}

/// Tuning of the control loop. All durations are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub max_actions: usize,
    pub dedupe_window_ms: u64,
    pub settle_delay_ms: u64,
    pub navigation_settle_timeout_ms: u64,
    pub wait_for_text_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_step_px: i64,
    pub scroll_pause_ms: u64,
    pub max_links: usize,
    pub explore_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            disable_images: false,
            args: vec![],
            script_timeout_ms: 10_000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: None,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            max_actions: 40,
            dedupe_window_ms: 7_000,
            settle_delay_ms: 900,
            navigation_settle_timeout_ms: 12_000,
            wait_for_text_timeout_ms: 8_000,
            poll_interval_ms: 250,
            scroll_step_px: 600,
            scroll_pause_ms: 350,
            max_links: 200,
            explore_links: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AutomationConfig {
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_window_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn navigation_settle_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Loads an optional JSON file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AgentError::Configuration(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AgentError::Configuration(format!("invalid config: {}", e)))
    }

    /// Overrides from a key lookup, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(PLANNER_URL_ENV) {
            self.planner.base_url = url;
        }
        if let Some(raw) = lookup(MAX_ACTIONS_ENV) {
            self.automation.max_actions = raw.trim().parse().map_err(|_| {
                AgentError::Configuration(format!("{} must be an integer, got {:?}", MAX_ACTIONS_ENV, raw))
            })?;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_loop_tuning() {
        let config = Config::default();
        assert_eq!(config.automation.max_actions, 40);
        assert_eq!(config.automation.dedupe_window(), Duration::from_secs(7));
        assert_eq!(config.automation.settle_delay(), Duration::from_millis(900));
        assert_eq!(config.planner.base_url, "http://localhost:8000");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            Config::from_json(r#"{"automation": {"max_actions": 5}, "browser": {"headless": false}}"#)
                .unwrap();
        assert_eq!(config.automation.max_actions, 5);
        assert_eq!(config.automation.dedupe_window_ms, 7_000);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport.width, 1280);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (PLANNER_URL_ENV, "http://planner:9000"),
            (MAX_ACTIONS_ENV, " 12 "),
            (LOG_LEVEL_ENV, "debug"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.planner.base_url, "http://planner:9000");
        assert_eq!(config.automation.max_actions, 12);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn bad_max_actions_override_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == MAX_ACTIONS_ENV).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(MAX_ACTIONS_ENV));
    }
}
