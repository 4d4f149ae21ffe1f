use crate::core::{BrowserConfig, BrowserTrait, FormSubmit, PageTrait};
use crate::dom::DomElement;
use crate::errors::{AgentError, Result};
use crate::types::{PageLocation, TabId};
use crate::utils::javascript as js;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
    script_timeout: Duration,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self {
            browser: None,
            script_timeout: Duration::from_millis(BrowserConfig::default().script_timeout_ms),
        }
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type Page = ChromePage;

    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if config.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| AgentError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| AgentError::LaunchFailed(e.to_string()))?;

        info!(headless = config.headless, "chrome launched");
        self.browser = Some(browser);
        self.script_timeout = Duration::from_millis(config.script_timeout_ms);
        Ok(())
    }

    async fn new_page(&self) -> Result<(TabId, ChromePage)> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(AgentError::BrowserNotLaunched)?;

        let tab = browser
            .new_tab()
            .map_err(|e| AgentError::TabCreationFailed(e.to_string()))?;

        let id = TabId::new(tab.get_target_id().to_string());
        debug!(tab = %id, "tab created");
        Ok((id, ChromePage::new(tab, self.script_timeout)))
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.browser = None;
        Ok(())
    }
}

/// One Chrome tab as a [`PageTrait`].
///
/// The protocol client is blocking, so every evaluation runs on the blocking
/// pool and is bounded by the script timeout.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
    script_timeout: Duration,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>, script_timeout: Duration) -> Self {
        Self {
            tab,
            script_timeout,
        }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Evaluates a script built by [`crate::utils::javascript`] and decodes
    /// the JSON string it yields.
    async fn evaluate<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let tab = Arc::clone(&self.tab);
        let evaluation = tokio::task::spawn_blocking(move || tab.evaluate(&script, false));

        let remote = tokio::time::timeout(self.script_timeout, evaluation)
            .await
            .map_err(|_| AgentError::JavaScriptTimeout)?
            .map_err(|e| AgentError::JavaScriptFailed(e.to_string()))?
            .map_err(|e| AgentError::JavaScriptFailed(e.to_string()))?;

        let raw = remote
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::JavaScriptFailed("script returned no value".into()))?;
        Ok(serde_json::from_str(raw)?)
    }

    async fn expect_element(&self, script: String, selector: &str) -> Result<()> {
        if self.evaluate::<bool>(script).await? {
            Ok(())
        } else {
            Err(AgentError::ElementNotFound(selector.to_string()))
        }
    }
}

#[async_trait]
impl PageTrait for ChromePage {
    async fn ping(&self) -> Result<()> {
        self.evaluate::<bool>(js::ping())
            .await
            .map(|_| ())
            .map_err(|e| AgentError::TabUnreachable(e.to_string()))
    }

    async fn location(&self) -> Result<PageLocation> {
        self.evaluate(js::location()).await
    }

    async fn content(&self) -> Result<String> {
        self.evaluate(js::content()).await
    }

    async fn query_all(&self, css: &str) -> Result<Vec<DomElement>> {
        self.evaluate(js::query_all(css)).await
    }

    async fn active_element(&self) -> Result<Option<DomElement>> {
        self.evaluate(js::active_element()).await
    }

    async fn set_location(&self, url: &str) -> Result<()> {
        self.evaluate::<bool>(js::set_location(url))
            .await
            .map(|_| ())
            .map_err(|e| AgentError::NavigationFailed(e.to_string()))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.expect_element(js::scroll_into_view(selector), selector).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.expect_element(js::click(selector), selector).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.expect_element(js::fill(selector, text), selector).await
    }

    async fn press_enter(&self, selector: Option<&str>) -> Result<()> {
        self.evaluate::<bool>(js::press_enter(selector)).await.map(|_| ())
    }

    async fn submit_form(&self, selector: &str) -> Result<FormSubmit> {
        let outcome: Option<String> = self.evaluate(js::submit_form(selector)).await?;
        match outcome.as_deref() {
            Some("clicked") => Ok(FormSubmit::ClickedButton),
            Some("submitted") => Ok(FormSubmit::Submitted),
            Some(_) => Ok(FormSubmit::NoForm),
            None => Err(AgentError::ElementNotFound(selector.to_string())),
        }
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.evaluate::<bool>(js::scroll_by(dy)).await.map(|_| ())
    }

    async fn body_text(&self) -> Result<String> {
        self.evaluate(js::body_text()).await
    }

    async fn ready_state(&self) -> Result<String> {
        self.evaluate(js::ready_state()).await
    }
}
