//! In-memory stand-ins for the page and the planning service.

use crate::actions::Step;
use crate::core::{FormSubmit, PageTrait};
use crate::dom::{DomElement, ElementRect};
use crate::errors::{AgentError, Result};
use crate::planner::{ExploreRequest, NextRequest, PlanRequest, Planner, PlannerError};
use crate::types::PageLocation;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";

/// Something a [`FakePage`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
    SetLocation(String),
    ScrollIntoView(String),
    Click(String),
    Fill(String, String),
    PressEnter(Option<String>),
    SubmitForm(String),
    ScrollBy(i64),
}

#[derive(Debug)]
struct FakeState {
    url: String,
    html: String,
    body_text: Option<String>,
    ready_state: String,
    reachable: bool,
    content_failures: usize,
    focused: Option<String>,
    values: HashMap<String, String>,
    routes: HashMap<String, String>,
    click_targets: HashMap<String, String>,
    submit_target: Option<String>,
    calls: Vec<PageCall>,
}

/// A page backed by parsed markup.
///
/// Layout is faked: every element gets a 100x20 box stacked by document
/// order, except elements carrying `hidden`, `type="hidden"` or an inline
/// `display:none`, which get none. Clicking a selector registered with
/// [`FakePage::on_click`], or submitting when [`FakePage::on_submit`] is
/// set, navigates to the routed markup.
#[derive(Debug)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.into(),
                html: html.into(),
                body_text: None,
                ready_state: "complete".to_string(),
                reachable: true,
                content_failures: 0,
                focused: None,
                values: HashMap::new(),
                routes: HashMap::new(),
                click_targets: HashMap::new(),
                submit_target: None,
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Markup served when the page navigates to `url`.
    pub fn route(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.state().routes.insert(url.into(), html.into());
        self
    }

    pub fn on_click(self, selector: impl Into<String>, url: impl Into<String>) -> Self {
        self.state().click_targets.insert(selector.into(), url.into());
        self
    }

    pub fn on_submit(self, url: impl Into<String>) -> Self {
        self.state().submit_target = Some(url.into());
        self
    }

    pub fn set_html(&self, html: impl Into<String>) {
        self.state().html = html.into();
    }

    pub fn set_body_text(&self, text: impl Into<String>) {
        self.state().body_text = Some(text.into());
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state().reachable = reachable;
    }

    pub fn set_ready_state(&self, ready_state: impl Into<String>) {
        self.state().ready_state = ready_state.into();
    }

    /// Makes the next `n` content reads fail.
    pub fn fail_content(&self, n: usize) {
        self.state().content_failures = n;
    }

    pub fn focus(&self, selector: impl Into<String>) {
        self.state().focused = Some(selector.into());
    }

    pub fn url(&self) -> String {
        self.state().url.clone()
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.state().calls.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PageCall::Click(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PageCall::Fill(selector, text) => Some((selector, text)),
                _ => None,
            })
            .collect()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state().values.get(selector).cloned()
    }

    fn record(&self, call: PageCall) {
        self.state().calls.push(call);
    }

    fn go(state: &mut FakeState, url: &str) {
        state.url = url.to_string();
        state.html = state
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE.to_string());
        state.body_text = None;
        state.focused = None;
        state.values.clear();
    }

    fn elements(&self, css: &str) -> Vec<DomElement> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };
        let state = self.state();
        let document = Html::parse_document(&state.html);
        document
            .select(&selector)
            .enumerate()
            .map(|(i, element)| {
                let mut dom = DomElement::from_element_ref(element, &document);
                if !is_hidden(element) {
                    dom.rect = Some(ElementRect::new(0.0, i as f64 * 20.0, 100.0, 20.0));
                }
                if let Some(value) = state.values.get(&dom.css_selector) {
                    dom.value = Some(value.clone());
                }
                dom
            })
            .collect()
    }

    fn find(&self, selector: &str) -> Result<DomElement> {
        self.elements(selector)
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ElementNotFound(selector.to_string()))
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let inline_none = value
        .attr("style")
        .map(|style| style.replace(' ', "").contains("display:none"))
        .unwrap_or(false);
    value.attr("hidden").is_some() || value.attr("type") == Some("hidden") || inline_none
}

#[async_trait]
impl PageTrait for FakePage {
    async fn ping(&self) -> Result<()> {
        if self.state().reachable {
            Ok(())
        } else {
            Err(AgentError::TabUnreachable("fake page is gone".into()))
        }
    }

    async fn location(&self) -> Result<PageLocation> {
        let state = self.state();
        let document = Html::parse_document(&state.html);
        let title = Selector::parse("title")
            .ok()
            .and_then(|selector| {
                document
                    .select(&selector)
                    .next()
                    .map(|t| t.text().collect::<String>().trim().to_string())
            })
            .unwrap_or_default();
        Ok(PageLocation::new(state.url.clone(), title))
    }

    async fn content(&self) -> Result<String> {
        let mut state = self.state();
        if state.content_failures > 0 {
            state.content_failures -= 1;
            return Err(AgentError::JavaScriptFailed("document unavailable".into()));
        }
        Ok(state.html.clone())
    }

    async fn query_all(&self, css: &str) -> Result<Vec<DomElement>> {
        Ok(self.elements(css))
    }

    async fn active_element(&self) -> Result<Option<DomElement>> {
        let focused = self.state().focused.clone();
        Ok(focused.and_then(|selector| self.elements(&selector).into_iter().next()))
    }

    async fn set_location(&self, url: &str) -> Result<()> {
        self.record(PageCall::SetLocation(url.to_string()));
        Self::go(&mut self.state(), url);
        Ok(())
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.find(selector)?;
        self.record(PageCall::ScrollIntoView(selector.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.find(selector)?;
        self.record(PageCall::Click(selector.to_string()));
        let mut state = self.state();
        if let Some(url) = state.click_targets.get(selector).cloned() {
            Self::go(&mut state, &url);
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.find(selector)?;
        self.record(PageCall::Fill(selector.to_string(), text.to_string()));
        let mut state = self.state();
        state.values.insert(element.css_selector, text.to_string());
        state.focused = Some(selector.to_string());
        Ok(())
    }

    async fn press_enter(&self, selector: Option<&str>) -> Result<()> {
        self.record(PageCall::PressEnter(selector.map(str::to_string)));
        Ok(())
    }

    async fn submit_form(&self, selector: &str) -> Result<FormSubmit> {
        self.find(selector)?;
        self.record(PageCall::SubmitForm(selector.to_string()));

        let outcome = {
            let state = self.state();
            let document = Html::parse_document(&state.html);
            let Ok(target) = Selector::parse(selector) else {
                return Ok(FormSubmit::NoForm);
            };
            let form = document.select(&target).next().and_then(|element| {
                element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|a| a.value().name() == "form")
            });
            match form {
                None => FormSubmit::NoForm,
                Some(form) => {
                    let submit = Selector::parse(r#"button[type="submit"], input[type="submit"], button:not([type])"#)
                        .ok()
                        .and_then(|s| form.select(&s).find(|b| !is_hidden(*b)));
                    if submit.is_some() {
                        FormSubmit::ClickedButton
                    } else {
                        FormSubmit::Submitted
                    }
                }
            }
        };

        if outcome != FormSubmit::NoForm {
            let mut state = self.state();
            if let Some(url) = state.submit_target.clone() {
                Self::go(&mut state, &url);
            }
        }
        Ok(outcome)
    }

    async fn scroll_by(&self, dy: i64) -> Result<()> {
        self.record(PageCall::ScrollBy(dy));
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        let state = self.state();
        if let Some(text) = &state.body_text {
            return Ok(text.clone());
        }
        let document = Html::parse_document(&state.html);
        let text = Selector::parse("body")
            .ok()
            .and_then(|s| document.select(&s).next().map(|b| b.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        Ok(crate::dom::element::collapse_whitespace(&text))
    }

    async fn ready_state(&self) -> Result<String> {
        Ok(self.state().ready_state.clone())
    }
}

type NextScript = Box<dyn Fn(&NextRequest, usize) -> Vec<Step> + Send + Sync>;

/// A planner that replays canned replies and records every request.
///
/// `next` answers from the queued replies first, then from the generator if
/// one is set, and otherwise with no steps.
#[derive(Default)]
pub struct ScriptedPlanner {
    plan_reply: Mutex<Option<std::result::Result<Vec<Step>, String>>>,
    next_replies: Mutex<VecDeque<std::result::Result<Vec<Step>, String>>>,
    generator: Option<NextScript>,
    fail_explore: bool,
    plans: Mutex<Vec<PlanRequest>>,
    nexts: Mutex<Vec<NextRequest>>,
    explores: Mutex<Vec<ExploreRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn scripted_failure(message: String) -> PlannerError {
    PlannerError::Http {
        status: 500,
        body: message,
    }
}

impl ScriptedPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(self, steps: Vec<Step>) -> Self {
        *lock(&self.plan_reply) = Some(Ok(steps));
        self
    }

    pub fn with_failing_plan(self, message: impl Into<String>) -> Self {
        *lock(&self.plan_reply) = Some(Err(message.into()));
        self
    }

    pub fn then_next(self, steps: Vec<Step>) -> Self {
        lock(&self.next_replies).push_back(Ok(steps));
        self
    }

    pub fn then_failing_next(self, message: impl Into<String>) -> Self {
        lock(&self.next_replies).push_back(Err(message.into()));
        self
    }

    /// Computes replies once the queued ones run out; the index counts
    /// `next` calls from zero.
    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&NextRequest, usize) -> Vec<Step> + Send + Sync + 'static,
    {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn with_failing_explore(mut self) -> Self {
        self.fail_explore = true;
        self
    }

    pub fn plan_requests(&self) -> Vec<PlanRequest> {
        lock(&self.plans).clone()
    }

    pub fn next_requests(&self) -> Vec<NextRequest> {
        lock(&self.nexts).clone()
    }

    pub fn explore_requests(&self) -> Vec<ExploreRequest> {
        lock(&self.explores).clone()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(&self, request: &PlanRequest) -> std::result::Result<Vec<Step>, PlannerError> {
        lock(&self.plans).push(request.clone());
        match lock(&self.plan_reply).clone() {
            Some(Ok(steps)) => Ok(steps),
            Some(Err(message)) => Err(scripted_failure(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn next(&self, request: &NextRequest) -> std::result::Result<Vec<Step>, PlannerError> {
        let index = {
            let mut nexts = lock(&self.nexts);
            nexts.push(request.clone());
            nexts.len() - 1
        };
        if let Some(reply) = lock(&self.next_replies).pop_front() {
            return reply.map_err(scripted_failure);
        }
        Ok(self
            .generator
            .as_ref()
            .map(|generate| generate(request, index))
            .unwrap_or_default())
    }

    async fn explore(&self, request: &ExploreRequest) -> std::result::Result<(), PlannerError> {
        lock(&self.explores).push(request.clone());
        if self.fail_explore {
            Err(scripted_failure("explore unavailable".into()))
        } else {
            Ok(())
        }
    }
}
