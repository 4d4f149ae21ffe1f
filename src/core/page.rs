use crate::dom::DomElement;
use crate::errors::Result;
use crate::types::PageLocation;
use async_trait::async_trait;

/// What a form submission attempt ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSubmit {
    /// A visible submit control inside the form was clicked.
    ClickedButton,
    /// `requestSubmit()` (or `submit()`) was called on the form.
    Submitted,
    /// The element is not inside a form.
    NoForm,
}

/// DOM primitives of one live page.
///
/// Everything the executor, resolver and snapshot producer need goes through
/// this trait, so the whole control loop runs against an in-memory page in
/// tests and against a real tab in production.
#[async_trait]
pub trait PageTrait: Send + Sync {
    /// Liveness probe; fails when the page context cannot answer.
    async fn ping(&self) -> Result<()>;

    async fn location(&self) -> Result<PageLocation>;

    /// Serialized markup of the whole document.
    async fn content(&self) -> Result<String>;

    /// All elements matching `css`, in document order, with their bounding
    /// boxes. An invalid selector yields an empty list.
    async fn query_all(&self, css: &str) -> Result<Vec<DomElement>>;

    /// The focused element, if any element other than the body has focus.
    async fn active_element(&self) -> Result<Option<DomElement>>;

    /// Sets `location.href`. Does not wait for the new document.
    async fn set_location(&self, url: &str) -> Result<()>;

    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Focuses the element, sets its value (or innerText for editable
    /// regions) and dispatches `input` and `change`.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Dispatches keydown/keypress/keyup for Enter on the element, or on the
    /// active element when no selector is given.
    async fn press_enter(&self, selector: Option<&str>) -> Result<()>;

    /// Submits the form enclosing the element.
    async fn submit_form(&self, selector: &str) -> Result<FormSubmit>;

    async fn scroll_by(&self, dy: i64) -> Result<()>;

    /// Visible text of the body.
    async fn body_text(&self) -> Result<String>;

    /// `document.readyState`.
    async fn ready_state(&self) -> Result<String>;
}
