use crate::actions::base::ENTER_SUBMIT_PAUSE;
use crate::actions::{Action, ActionContext, ActionError, ActionKind, ActionOutcome, Step};
use crate::core::{FormSubmit, PageTrait};
use crate::dom::DomElement;
use crate::errors::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Inputs tried when neither the step nor the focus names a target.
pub const GENERIC_TEXT_INPUTS: &str = r#"input[type="search"], input[name="q"], input[type="text"], textarea, [contenteditable="true"]"#;

/// Last resort when the typed-into element has no form.
pub const SEARCH_BUTTON_FALLBACK: &str = r#"button[aria-label*="Search"], input[type="submit"][value*="Search"], button[name="btnK"], input[name="btnK"]"#;

fn search_prompt() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(^|\s)(search|find)\b").ok())
        .as_ref()
}

/// Whether typing should be followed by a submission even without `enter`.
pub fn looks_like_search(prompt: &str, current_url: &str) -> bool {
    search_prompt().map_or(false, |re| re.is_match(prompt)) || current_url.contains("q=")
}

pub struct TypeAction;

impl TypeAction {
    async fn fallback_target(&self, page: &dyn PageTrait) -> Result<Option<DomElement>> {
        if let Some(focused) = page.active_element().await? {
            if focused.is_text_input() {
                return Ok(Some(focused));
            }
        }
        let mut inputs = page.query_all(GENERIC_TEXT_INPUTS).await?;
        let visible = inputs.iter().position(DomElement::is_visible);
        Ok(match visible {
            Some(i) => Some(inputs.swap_remove(i)),
            None => inputs.into_iter().next(),
        })
    }

    async fn submit(&self, page: &dyn PageTrait, selector: &str) -> Result<()> {
        page.press_enter(Some(selector)).await?;
        tokio::time::sleep(ENTER_SUBMIT_PAUSE).await;

        match page.submit_form(selector).await? {
            FormSubmit::ClickedButton | FormSubmit::Submitted => Ok(()),
            FormSubmit::NoForm => {
                let buttons = page.query_all(SEARCH_BUTTON_FALLBACK).await?;
                if let Some(button) = buttons.iter().find(|b| b.is_visible()) {
                    debug!(selector = %button.css_selector, "clicking search button fallback");
                    page.click(&button.css_selector).await?;
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Action for TypeAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Type
    }

    fn description(&self) -> &str {
        "Type text into a field and optionally submit it"
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> Result<ActionOutcome> {
        let target = match context.resolver.resolve(page, step).await? {
            Some(target) => target,
            None => self
                .fallback_target(page)
                .await?
                .ok_or(ActionError::TargetNotFound)?,
        };

        let text = step.text.as_deref().unwrap_or_default();
        page.fill(&target.css_selector, text).await?;

        let current_url = page.location().await.map(|l| l.url).unwrap_or_default();
        let submit = step.enter.unwrap_or(false) || looks_like_search(&context.prompt, &current_url);
        if submit {
            if let Err(e) = self.submit(page, &target.css_selector).await {
                warn!(selector = %target.css_selector, error = %e, "submission after typing failed");
            }
        }
        Ok(ActionOutcome::success())
    }
}
