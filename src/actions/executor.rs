use crate::actions::{ActionContext, ActionError, ActionOutcome, ActionRegistry, Step};
use crate::core::PageTrait;
use crate::errors::AgentError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Runs one step against a page. Never fails: every error becomes an
/// `ok: false` outcome carrying the error string.
#[derive(Clone)]
pub struct ActionExecutor {
    registry: Arc<ActionRegistry>,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(ActionRegistry::with_builtin())
    }
}

impl ActionExecutor {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub async fn execute(
        &self,
        page: &dyn PageTrait,
        step: &Step,
        context: &ActionContext,
    ) -> ActionOutcome {
        let Some(action) = self.registry.get(&step.action) else {
            let error = ActionError::UnknownAction(step.action.to_string());
            warn!(action = %step.action, "no action registered");
            return ActionOutcome::failure(error.to_string());
        };

        if let Err(e) = action.validate(step) {
            return ActionOutcome::failure(e.to_string());
        }

        let started = Instant::now();
        let result = action.execute(page, step, context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                debug!(step = %step, elapsed_ms, navigated = outcome.did_navigate, "step executed");
                outcome
            }
            Err(e) => {
                let error = match e {
                    AgentError::Action(code) => code.to_string(),
                    other => other.to_string(),
                };
                debug!(step = %step, elapsed_ms, %error, "step failed");
                ActionOutcome::failure(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionKind, ActionTiming, ScrollDirection};
    use crate::testing::{FakePage, PageCall};
    use std::time::Duration;

    const SEARCH_PAGE: &str = r#"<html><head><title>Example</title></head><body>
        <form action="/search">
          <input id="q" type="search" aria-label="Search">
          <button type="submit">Search</button>
        </form>
        <a id="more" href="/more">More</a>
        <div id="note" contenteditable="true" aria-label="Note"></div>
        </body></html>"#;

    fn context(prompt: &str) -> ActionContext {
        ActionContext::new(prompt)
    }

    async fn run(page: &FakePage, step: Step, prompt: &str) -> ActionOutcome {
        ActionExecutor::default().execute(page, &step, &context(prompt)).await
    }

    #[tokio::test]
    async fn navigate_requires_url_and_reports_navigation() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let outcome = run(&page, Step::new(ActionKind::Navigate), "").await;
        assert_eq!(outcome.error.as_deref(), Some("missing-url"));

        let outcome = run(&page, Step::navigate("https://example.com/next"), "").await;
        assert!(outcome.ok && outcome.did_navigate);
        assert_eq!(page.url(), "https://example.com/next");
    }

    #[tokio::test]
    async fn click_scrolls_into_view_then_clicks() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let outcome = run(&page, Step::click_query("link", "More"), "").await;
        assert!(outcome.ok);
        assert!(!outcome.did_navigate);
        assert_eq!(
            page.calls(),
            vec![
                PageCall::ScrollIntoView("#more".into()),
                PageCall::Click("#more".into())
            ]
        );
    }

    #[tokio::test]
    async fn click_without_target_fails() {
        let page = FakePage::new("https://example.com/", "<body><p>nothing</p></body>");
        let outcome = run(&page, Step::click_query("button", "Buy"), "").await;
        assert_eq!(outcome, ActionOutcome::failure("target-not-found"));
        assert!(page.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn type_with_enter_submits_the_form() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let step = Step::type_query("textbox", "Search", "cricket news").with_enter(true);
        let outcome = run(&page, step, "open cricket news").await;
        assert!(outcome.ok);
        assert_eq!(page.value_of("#q").as_deref(), Some("cricket news"));
        assert_eq!(
            page.calls(),
            vec![
                PageCall::Fill("#q".into(), "cricket news".into()),
                PageCall::PressEnter(Some("#q".into())),
                PageCall::SubmitForm("#q".into()),
            ]
        );
    }

    #[tokio::test]
    async fn type_without_submission_just_fills() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let outcome = run(&page, Step::type_query("textbox", "Note", "hello"), "write a note").await;
        assert!(outcome.ok);
        assert_eq!(page.calls(), vec![PageCall::Fill("#note".into(), "hello".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_prompt_triggers_submission() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        run(&page, Step::type_query("textbox", "Search", "shoes"), "search for shoes").await;
        assert!(page.calls().contains(&PageCall::SubmitForm("#q".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn type_falls_back_to_focus_then_generic_inputs() {
        let html = r#"<body><input id="a" type="checkbox"><textarea id="t"></textarea>
                      <input id="s" type="search" hidden>
                      <button aria-label="Search site" id="b">Go</button></body>"#;
        let page = FakePage::new("https://example.com/", html);
        page.focus("#a");
        let mut step = Step::type_query("textbox", "Nonexistent", "x");
        step.query = None;
        step.enter = Some(true);
        let outcome = run(&page, step, "").await;
        assert!(outcome.ok);
        let calls = page.calls();
        assert_eq!(calls[0], PageCall::Fill("#t".into(), "x".into()));
        assert!(calls.contains(&PageCall::Click("#b".into())));

        let page = FakePage::new("https://example.com/", html);
        page.focus("#t");
        let mut step = Step::new(ActionKind::Type);
        step.text = Some("y".into());
        run(&page, step, "").await;
        assert_eq!(page.fills(), vec![("#t".to_string(), "y".to_string())]);
    }

    #[tokio::test]
    async fn type_with_no_input_anywhere_fails() {
        let page = FakePage::new("https://example.com/", "<body><a href='/'>x</a></body>");
        let outcome = run(&page, Step::type_query("textbox", "Search", "x"), "").await;
        assert_eq!(outcome.error.as_deref(), Some("target-not-found"));
    }

    #[tokio::test]
    async fn press_enter_goes_to_the_active_element() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        assert!(run(&page, Step::press_enter(), "").await.ok);
        assert_eq!(page.calls(), vec![PageCall::PressEnter(None)]);
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_repeats_with_pauses() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let start = tokio::time::Instant::now();
        run(&page, Step::scroll(ScrollDirection::Up, 3), "").await;
        assert_eq!(page.calls(), vec![PageCall::ScrollBy(-600); 3]);
        assert_eq!(start.elapsed(), Duration::from_millis(700));

        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        run(&page, Step::new(ActionKind::Scroll), "").await;
        assert_eq!(page.calls(), vec![PageCall::ScrollBy(600)]);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_text_polls_until_timeout() {
        let page = FakePage::new("https://example.com/", "<body>Loading</body>");
        let executor = ActionExecutor::default();
        let ctx = context("").with_timing(ActionTiming {
            poll_interval: Duration::from_millis(100),
            ..ActionTiming::default()
        });

        let outcome = executor.execute(&page, &Step::new(ActionKind::WaitForText), &ctx).await;
        assert_eq!(outcome.error.as_deref(), Some("missing-text"));

        let mut step = Step::wait_for_text("Results");
        step.timeout = Some(1000);
        let outcome = executor.execute(&page, &step, &ctx).await;
        assert_eq!(outcome.error.as_deref(), Some("timeout"));

        page.set_body_text("12 Results found");
        let outcome = executor.execute(&page, &step, &ctx).await;
        assert!(outcome.ok);
    }

    #[tokio::test]
    async fn done_and_unknown_actions() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        assert_eq!(run(&page, Step::done(), "").await, ActionOutcome::finished());
        let outcome = run(&page, Step::new(ActionKind::Other("hover".into())), "").await;
        assert_eq!(outcome.error.as_deref(), Some("unknown-action:hover"));
    }

    #[tokio::test]
    async fn only_registered_actions_run() {
        let page = FakePage::new("https://example.com/", SEARCH_PAGE);
        let mut registry = ActionRegistry::new();
        registry.register(crate::actions::ClickAction);
        let executor = ActionExecutor::new(registry);
        assert!(executor.execute(&page, &Step::click_selector("#more"), &context("")).await.ok);
        let outcome = executor.execute(&page, &Step::done(), &context("")).await;
        assert_eq!(outcome.error.as_deref(), Some("unknown-action:done"));
    }
}
