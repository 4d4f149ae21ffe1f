use crate::actions::{Action, ActionContext, ActionError, ActionKind, ActionOutcome, Step};
use crate::core::PageTrait;
use crate::errors::Result;
use async_trait::async_trait;

/// Sets the page location. Reports navigation without waiting for load.
pub struct NavigateAction;

#[async_trait]
impl Action for NavigateAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Navigate
    }

    fn description(&self) -> &str {
        "Navigate the tab to a URL"
    }

    fn validate(&self, step: &Step) -> std::result::Result<(), ActionError> {
        match step.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(()),
            _ => Err(ActionError::MissingUrl),
        }
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        _context: &ActionContext,
    ) -> Result<ActionOutcome> {
        let url = step.url.as_deref().map(str::trim).ok_or(ActionError::MissingUrl)?;
        page.set_location(url).await?;
        Ok(ActionOutcome::navigated())
    }
}
