use crate::actions::{Action, ActionContext, ActionError, ActionKind, ActionOutcome, Step};
use crate::core::PageTrait;
use crate::errors::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct ClickAction;

#[async_trait]
impl Action for ClickAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Click
    }

    fn description(&self) -> &str {
        "Click the element a selector or query resolves to"
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> Result<ActionOutcome> {
        let target = context
            .resolver
            .resolve(page, step)
            .await?
            .ok_or(ActionError::TargetNotFound)?;

        debug!(selector = %target.css_selector, "clicking");
        page.scroll_into_view(&target.css_selector).await?;
        page.click(&target.css_selector).await?;
        Ok(ActionOutcome::success())
    }
}
