use crate::actions::{
    Action, ActionKind, ClickAction, DoneAction, NavigateAction, PressEnterAction, ScrollAction,
    TypeAction, WaitForTextAction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for step actions, keyed by kind
pub struct ActionRegistry {
    actions: HashMap<ActionKind, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Registry with every built-in action
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NavigateAction);
        registry.register(ClickAction);
        registry.register(TypeAction);
        registry.register(PressEnterAction);
        registry.register(ScrollAction);
        registry.register(WaitForTextAction);
        registry.register(DoneAction);
        registry
    }

    /// Register an action, replacing any previous one for the same kind
    pub fn register<A: Action + 'static>(&mut self, action: A) {
        self.actions.insert(action.kind(), Arc::new(action));
    }

    pub fn get(&self, kind: &ActionKind) -> Option<Arc<dyn Action>> {
        self.actions.get(kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.keys().cloned().collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_known_kind() {
        let registry = ActionRegistry::with_builtin();
        for kind in [
            ActionKind::Navigate,
            ActionKind::Click,
            ActionKind::Type,
            ActionKind::PressEnter,
            ActionKind::Scroll,
            ActionKind::WaitForText,
            ActionKind::Done,
        ] {
            assert!(registry.get(&kind).is_some(), "{} missing", kind);
        }
        assert!(registry.get(&ActionKind::Other("hover".into())).is_none());
        assert_eq!(registry.kinds().len(), 7);
    }

    #[test]
    fn empty_registry_has_nothing() {
        assert!(ActionRegistry::new().kinds().is_empty());
    }
}
