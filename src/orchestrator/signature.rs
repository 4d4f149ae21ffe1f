use crate::actions::{ActionKind, Step};

/// What a step acts on, normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureTarget {
    Selector(String),
    Query { role: String, name: String },
    Url(String),
    Nothing,
}

/// Fingerprint of "the same attempted action".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepSignature {
    pub action: ActionKind,
    pub target: SignatureTarget,
    pub text: String,
}

impl StepSignature {
    pub fn of(step: &Step) -> Self {
        let selector = step.selector.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let url = step.url.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let target = if let Some(selector) = selector {
            SignatureTarget::Selector(selector.to_string())
        } else if let Some(query) = &step.query {
            SignatureTarget::Query {
                role: query.role.trim().to_lowercase(),
                name: query.name.trim().to_lowercase(),
            }
        } else if let Some(url) = url {
            SignatureTarget::Url(url.to_string())
        } else {
            SignatureTarget::Nothing
        };

        Self {
            action: step.action.clone(),
            target,
            text: step.text.as_deref().unwrap_or_default().trim().to_string(),
        }
    }
}

impl From<&Step> for StepSignature {
    fn from(step: &Step) -> Self {
        Self::of(step)
    }
}
