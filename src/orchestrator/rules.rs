use crate::actions::{ActionKind, Step};
use crate::dom::Snapshot;
use std::sync::Arc;

/// What a rewrite rule may look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteContext {
    pub url: String,
    pub host: String,
}

impl RewriteContext {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let host = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default();
        Self { url, host }
    }
}

impl From<&Snapshot> for RewriteContext {
    fn from(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.url.clone())
    }
}

/// A pure correction applied to a step before it is dispatched.
pub trait RewriteRule: Send + Sync {
    fn name(&self) -> &str;

    fn rewrite(&self, step: Step, context: &RewriteContext) -> Step;
}

/// Planners often call a search field a combobox; typing needs the textbox.
pub struct TypeIntoTextbox;

impl RewriteRule for TypeIntoTextbox {
    fn name(&self) -> &str {
        "type-into-textbox"
    }

    fn rewrite(&self, mut step: Step, _context: &RewriteContext) -> Step {
        if step.action == ActionKind::Type {
            if let Some(query) = step.query.as_mut() {
                if query.role.trim().eq_ignore_ascii_case("combobox") {
                    query.role = "textbox".to_string();
                }
            }
        }
        step
    }
}

/// Amazon's category dropdown sits next to the search box and is a
/// combobox; a "click combobox Search" means the box.
pub struct AmazonSearchBox;

impl RewriteRule for AmazonSearchBox {
    fn name(&self) -> &str {
        "amazon-search-box"
    }

    fn rewrite(&self, mut step: Step, context: &RewriteContext) -> Step {
        let on_amazon = context.host.split('.').any(|label| label == "amazon");
        if on_amazon && step.action == ActionKind::Click {
            if let Some(query) = step.query.as_mut() {
                if query.role.trim().eq_ignore_ascii_case("combobox") {
                    query.role = "textbox".to_string();
                }
            }
        }
        step
    }
}

/// Ordered list of rewrite rules. Each rule sees the previous rule's output.
#[derive(Clone)]
pub struct RewriteRules {
    rules: Vec<Arc<dyn RewriteRule>>,
}

impl RewriteRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push<R: RewriteRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn apply(&self, step: Step, context: &RewriteContext) -> Step {
        self.rules
            .iter()
            .fold(step, |step, rule| rule.rewrite(step, context))
    }
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self::empty().push(TypeIntoTextbox).push(AmazonSearchBox)
    }
}

impl std::fmt::Debug for RewriteRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
