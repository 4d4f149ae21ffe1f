use crate::core::PageTrait;
use crate::types::TabId;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Live page handles by tab id.
#[derive(Default)]
pub struct TabRegistry {
    pages: DashMap<TabId, Arc<dyn PageTrait>>,
}

impl TabRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `page` under `tab`, replacing any previous handle.
    pub fn insert(&self, tab: TabId, page: Arc<dyn PageTrait>) {
        debug!(tab = %tab, "tab registered");
        self.pages.insert(tab, page);
    }

    pub fn get(&self, tab: &TabId) -> Option<Arc<dyn PageTrait>> {
        self.pages.get(tab).map(|page| Arc::clone(&page))
    }

    pub fn remove(&self, tab: &TabId) -> Option<Arc<dyn PageTrait>> {
        self.pages.remove(tab).map(|(_, page)| page)
    }

    pub fn contains(&self, tab: &TabId) -> bool {
        self.pages.contains_key(tab)
    }

    pub fn ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.pages.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl std::fmt::Debug for TabRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabRegistry").field("tabs", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    #[tokio::test]
    async fn tabs_are_independent() {
        let tabs = TabRegistry::new();
        tabs.insert("b".into(), Arc::new(FakePage::new("https://b.test/", "")));
        tabs.insert("a".into(), Arc::new(FakePage::new("https://a.test/", "")));
        assert_eq!(tabs.ids(), vec![TabId::from("a"), TabId::from("b")]);

        let a = tabs.get(&"a".into()).unwrap();
        assert_eq!(a.location().await.unwrap().url, "https://a.test/");

        assert!(tabs.remove(&"a".into()).is_some());
        assert!(!tabs.contains(&"a".into()));
        assert!(tabs.contains(&"b".into()));
        assert_eq!(tabs.len(), 1);
    }
}
