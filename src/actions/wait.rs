use crate::actions::{Action, ActionContext, ActionError, ActionKind, ActionOutcome, Step};
use crate::core::PageTrait;
use crate::errors::Result;
use crate::utils::poll_until;
use async_trait::async_trait;
use std::time::Duration;

/// Polls the body text until it contains the step's text.
pub struct WaitForTextAction;

#[async_trait]
impl Action for WaitForTextAction {
    fn kind(&self) -> ActionKind {
        ActionKind::WaitForText
    }

    fn description(&self) -> &str {
        "Wait until the page text contains a string"
    }

    fn validate(&self, step: &Step) -> std::result::Result<(), ActionError> {
        match step.text.as_deref() {
            Some(text) if !text.is_empty() => Ok(()),
            _ => Err(ActionError::MissingText),
        }
    }

    async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> Result<ActionOutcome> {
        let wanted = step.text.as_deref().ok_or(ActionError::MissingText)?;
        let timeout = step
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(context.timing.wait_for_text_timeout);

        let seen = poll_until(timeout, context.timing.poll_interval, move || async move {
            page.body_text().await.map(|text| text.contains(wanted))
        })
        .await?;

        if seen {
            Ok(ActionOutcome::success())
        } else {
            Err(ActionError::Timeout.into())
        }
    }
}

/// Terminal marker.
pub struct DoneAction;

#[async_trait]
impl Action for DoneAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Done
    }

    fn description(&self) -> &str {
        "Mark the goal as reached"
    }

    async fn execute(
        &self,
        _page: &dyn PageTrait,
        _step: &Step,
        _context: &ActionContext,
    ) -> Result<ActionOutcome> {
        Ok(ActionOutcome::finished())
    }
}
