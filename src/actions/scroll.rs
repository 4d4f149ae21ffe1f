use crate::actions::step::ScrollDirection;
use crate::actions::{Action, ActionContext, ActionKind, ActionOutcome, Step};
use crate::core::PageTrait;
use crate::errors::Result;
use async_trait::async_trait;

pub struct ScrollAction;

#[async_trait]
impl Action for ScrollAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Scroll
    }

    fn description(&self) -> &str {
        "Scroll the viewport up or down in fixed increments"
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> Result<ActionOutcome> {
        let times = step.times.unwrap_or(1).max(1);
        let dy = match step.direction.unwrap_or_default() {
            ScrollDirection::Up => -context.timing.scroll_step_px,
            ScrollDirection::Down => context.timing.scroll_step_px,
        };

        for i in 0..times {
            if i > 0 {
                tokio::time::sleep(context.timing.scroll_pause).await;
            }
            page.scroll_by(dy).await?;
        }
        Ok(ActionOutcome::success())
    }
}
