use crate::actions::{Action, ActionContext, ActionKind, ActionOutcome, Step};
use crate::core::PageTrait;
use crate::errors::Result;
use async_trait::async_trait;

/// Enter key sequence on whatever has focus.
pub struct PressEnterAction;

#[async_trait]
impl Action for PressEnterAction {
    fn kind(&self) -> ActionKind {
        ActionKind::PressEnter
    }

    fn description(&self) -> &str {
        "Press Enter on the focused element"
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        _step: &Step,
        _context: &ActionContext,
    ) -> Result<ActionOutcome> {
        page.press_enter(None).await?;
        Ok(ActionOutcome::success())
    }
}
