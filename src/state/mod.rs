pub mod panel;
pub mod run;
pub mod window;

pub use panel::{PanelPatch, PanelState, PanelTab};
pub use run::RunState;
pub use window::TimeWindowedSet;

use crate::types::TabId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-tab run and panel state. Closures handed to the store run under a
/// shard lock and must not block or await.
#[derive(Debug, Default)]
pub struct TabStateStore {
    runs: DashMap<TabId, RunState>,
    panels: DashMap<TabId, PanelState>,
}

impl TabStateStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts a run unless one is active for `tab`. The run lives as long
    /// as the returned guard.
    pub fn try_begin_run(
        self: &Arc<Self>,
        tab: &TabId,
        prompt: &str,
        dedupe_window: Duration,
    ) -> Option<RunGuard> {
        match self.runs.entry(tab.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(RunState::new(prompt, dedupe_window));
                debug!(tab = %tab, "run state created");
                Some(RunGuard {
                    store: Arc::clone(self),
                    tab: tab.clone(),
                })
            }
        }
    }

    pub fn is_running(&self, tab: &TabId) -> bool {
        self.runs.get(tab).map(|run| run.running).unwrap_or(false)
    }

    /// Copy of the tab's run state, if a run is active.
    pub fn run_state(&self, tab: &TabId) -> Option<RunState> {
        self.runs.get(tab).map(|run| run.clone())
    }

    pub fn active_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn panel(&self, tab: &TabId) -> Option<PanelState> {
        self.panels.get(tab).map(|panel| panel.clone())
    }

    /// Applies `patch`, creating the tab's panel state if needed, and
    /// returns the result.
    pub fn patch_panel(&self, tab: &TabId, patch: PanelPatch) -> PanelState {
        let mut panel = self.panels.entry(tab.clone()).or_default();
        panel.apply(patch);
        panel.clone()
    }

    pub fn update_panel<R>(&self, tab: &TabId, f: impl FnOnce(&mut PanelState) -> R) -> R {
        let mut panel = self.panels.entry(tab.clone()).or_default();
        f(&mut panel)
    }

    /// The stored open flag, or `default` when the tab has no panel state.
    pub fn open_flag(&self, tab: &TabId, default: bool) -> bool {
        self.panels.get(tab).map(|panel| panel.open).unwrap_or(default)
    }

    pub fn set_open_flag(&self, tab: &TabId, open: bool) {
        self.update_panel(tab, |panel| panel.open = open);
    }

    /// Forgets everything about a closed tab.
    pub fn remove_tab(&self, tab: &TabId) {
        self.runs.remove(tab);
        self.panels.remove(tab);
    }
}

/// Holds a tab's run open; dropping it removes the run state.
#[derive(Debug)]
pub struct RunGuard {
    store: Arc<TabStateStore>,
    tab: TabId,
}

impl RunGuard {
    pub fn tab(&self) -> &TabId {
        &self.tab
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut RunState) -> R) -> Option<R> {
        self.store.runs.get_mut(&self.tab).map(|mut run| f(&mut run))
    }

    pub fn read<R>(&self, f: impl FnOnce(&RunState) -> R) -> Option<R> {
        self.store.runs.get(&self.tab).map(|run| f(&run))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.store.runs.remove(&self.tab);
        debug!(tab = %self.tab, "run state removed");
    }
}
