use crate::actions::{ActionContext, ActionExecutor, ActionKind, ActionTiming, Step};
use crate::browser::TabRegistry;
use crate::core::{AutomationConfig, PageTrait};
use crate::dom::{Snapshot, SnapshotProducer};
use crate::errors::Result;
use crate::orchestrator::events::{AutomationEvent, EventEnvelope, StopReason};
use crate::orchestrator::{RewriteContext, RewriteRules, StepSignature};
use crate::planner::{ExploreRequest, NextRequest, PlanRequest, Planner};
use crate::state::{RunGuard, TabStateStore, TimeWindowedSet};
use crate::types::TabId;
use crate::utils::poll_until;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 256;

/// Why a run never began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StartFailure {
    NoSuchTab,
    Unreachable(String),
    NoSnapshot(String),
}

impl std::fmt::Display for StartFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartFailure::NoSuchTab => f.write_str("no such tab"),
            StartFailure::Unreachable(e) => write!(f, "tab unreachable: {}", e),
            StartFailure::NoSnapshot(e) => write!(f, "page not ready: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub actions_taken: usize,
    pub skipped: usize,
    pub executed: Vec<Step>,
    pub reason: StopReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    /// Another run owns the tab; nothing happened.
    AlreadyRunning,
    NotStarted { failure: StartFailure },
    Finished(RunSummary),
}

/// Drops suggestions already tried within the dedupe window.
///
/// When the executed step was a `type`, the page did not change and the
/// planner asks for the same typing again, the field most likely needs an
/// explicit submit; a single `pressEnter` is put first instead.
pub fn filter_suggestions(
    recent: &TimeWindowedSet<StepSignature>,
    executed: &Step,
    page_unchanged: bool,
    suggested: Vec<Step>,
) -> (Vec<Step>, bool) {
    let executed_signature = StepSignature::of(executed);
    let retyping = executed.action == ActionKind::Type
        && page_unchanged
        && suggested
            .iter()
            .any(|s| StepSignature::of(s) == executed_signature);

    let mut kept: Vec<Step> = suggested
        .into_iter()
        .filter(|s| {
            let signature = StepSignature::of(s);
            signature != executed_signature && !recent.contains(&signature)
        })
        .collect();

    let mut synthesized = false;
    if retyping {
        let enter = Step::press_enter();
        let already_pending = kept.iter().any(|s| s.action == ActionKind::PressEnter);
        if !already_pending && !recent.contains(&StepSignature::of(&enter)) {
            kept.insert(0, enter);
            synthesized = true;
        }
    }
    (kept, synthesized)
}

/// Owns the plan → act → observe → re-plan loop for every tab.
pub struct Orchestrator {
    store: Arc<TabStateStore>,
    tabs: Arc<TabRegistry>,
    planner: Arc<dyn Planner>,
    executor: ActionExecutor,
    snapshots: SnapshotProducer,
    rules: RewriteRules,
    config: AutomationConfig,
    events: broadcast::Sender<EventEnvelope>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<TabStateStore>,
        tabs: Arc<TabRegistry>,
        planner: Arc<dyn Planner>,
        config: AutomationConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            tabs,
            planner,
            executor: ActionExecutor::default(),
            snapshots: SnapshotProducer::new(config.max_links),
            rules: RewriteRules::default(),
            config,
            events,
        }
    }

    pub fn with_executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_rules(mut self, rules: RewriteRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<TabStateStore> {
        &self.store
    }

    pub fn tabs(&self) -> &Arc<TabRegistry> {
        &self.tabs
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    fn emit(&self, tab: &TabId, event: AutomationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(EventEnvelope::new(tab.clone(), event));
    }

    fn emit_steps(&self, guard: &RunGuard) {
        if let Some((executed, queued)) =
            guard.read(|run| (run.executed_steps.clone(), run.queued()))
        {
            self.emit(guard.tab(), AutomationEvent::Steps { executed, queued });
        }
    }

    /// Runs the goal `prompt` on `tab` to completion.
    ///
    /// Returns at once with [`RunReport::AlreadyRunning`] when the tab has an
    /// active run. The tab's run state is released whenever this returns or
    /// unwinds.
    pub async fn run(&self, tab: &TabId, prompt: &str) -> RunReport {
        match self.reserve(tab, prompt) {
            Some(guard) => self.run_reserved(guard, prompt).await,
            None => {
                debug!(tab = %tab, "run already active, ignoring start");
                RunReport::AlreadyRunning
            }
        }
    }

    /// Claims `tab` for a run without starting it. `None` when a run is
    /// already active there.
    pub fn reserve(&self, tab: &TabId, prompt: &str) -> Option<RunGuard> {
        self.store.try_begin_run(tab, prompt, self.config.dedupe_window())
    }

    /// Runs on a tab claimed with [`Orchestrator::reserve`].
    pub async fn run_reserved(&self, guard: RunGuard, prompt: &str) -> RunReport {
        let tab = guard.tab().clone();
        let tab = &tab;
        let (page, snapshot) = match self.prepare(tab).await {
            Ok(ready) => ready,
            Err(failure) => {
                warn!(tab = %tab, %failure, "automation did not start");
                self.emit(
                    tab,
                    AutomationEvent::StartFailed {
                        reason: failure.to_string(),
                    },
                );
                return RunReport::NotStarted { failure };
            }
        };

        info!(tab = %tab, prompt, url = %snapshot.url, "automation started");
        self.emit(
            tab,
            AutomationEvent::Started {
                prompt: prompt.to_string(),
            },
        );

        let plan = PlanRequest {
            prompt: prompt.to_string(),
            dom: snapshot.controls.clone(),
            start_url: snapshot.url.clone(),
        };
        let steps = match self.planner.plan(&plan).await {
            Ok(steps) => steps,
            Err(e) => {
                warn!(tab = %tab, error = %e, "initial plan failed");
                self.emit(
                    tab,
                    AutomationEvent::PlannerFailed {
                        stage: "plan".into(),
                        error: e.to_string(),
                    },
                );
                Vec::new()
            }
        };
        info!(tab = %tab, steps = steps.len(), "plan received");
        self.emit(tab, AutomationEvent::Planned { steps: steps.len() });
        guard.update(|run| run.queue.extend(steps));
        self.emit_steps(&guard);

        let summary = self.drive(&guard, page.as_ref(), prompt, snapshot).await;
        info!(
            tab = %tab,
            actions = summary.actions_taken,
            skipped = summary.skipped,
            reason = ?summary.reason,
            "automation finished"
        );
        self.emit(
            tab,
            AutomationEvent::Finished {
                actions_taken: summary.actions_taken,
                reason: summary.reason,
            },
        );
        RunReport::Finished(summary)
    }

    async fn prepare(
        &self,
        tab: &TabId,
    ) -> std::result::Result<(Arc<dyn PageTrait>, Snapshot), StartFailure> {
        let page = self.tabs.get(tab).ok_or(StartFailure::NoSuchTab)?;
        page.ping()
            .await
            .map_err(|e| StartFailure::Unreachable(e.to_string()))?;
        let snapshot = self
            .snapshots
            .capture(page.as_ref())
            .await
            .map_err(|e| StartFailure::NoSnapshot(e.to_string()))?;
        Ok((page, snapshot))
    }

    async fn drive(
        &self,
        guard: &RunGuard,
        page: &dyn PageTrait,
        prompt: &str,
        mut snapshot: Snapshot,
    ) -> RunSummary {
        let tab = guard.tab().clone();
        let context = ActionContext::new(prompt).with_timing(ActionTiming::from(&self.config));
        let mut skipped = 0;

        let reason = loop {
            let next = guard
                .update(|run| {
                    if run.queue.is_empty() {
                        Err(StopReason::QueueEmpty)
                    } else if run.actions_taken >= self.config.max_actions {
                        Err(StopReason::BudgetExhausted)
                    } else {
                        run.pop_front().ok_or(StopReason::QueueEmpty)
                    }
                })
                .unwrap_or(Err(StopReason::QueueEmpty));
            let step = match next {
                Ok(step) => step,
                Err(reason) => break reason,
            };

            let step = self.rules.apply(step, &RewriteContext::from(&snapshot));
            let signature = StepSignature::of(&step);
            if guard.read(|run| run.is_recent(&signature)).unwrap_or(false) {
                debug!(tab = %tab, action = %step, "skipping repeated step");
                skipped += 1;
                self.emit(&tab, AutomationEvent::StepSkipped { step });
                continue;
            }

            info!(tab = %tab, action = %step, "executing step");
            self.emit(&tab, AutomationEvent::StepStarted { step: step.clone() });
            let outcome = self.executor.execute(page, &step, &context).await;
            guard.update(|run| {
                run.remember(signature);
                run.executed_steps.push(step.clone());
            });
            if let Some(error) = outcome.error.clone().filter(|_| !outcome.ok) {
                warn!(tab = %tab, action = %step, %error, "step failed");
                self.emit(
                    &tab,
                    AutomationEvent::StepFailed {
                        step: step.clone(),
                        error,
                    },
                );
            }

            tokio::time::sleep(self.config.settle_delay()).await;
            if outcome.did_navigate {
                self.wait_for_document(page).await;
            }

            let goal_reached = step.is_done() || outcome.done;

            let fresh = match self.observe(page).await {
                Ok(fresh) => fresh,
                Err(e) if goal_reached => {
                    debug!(tab = %tab, error = %e, "no snapshot after done");
                    self.emit_steps(guard);
                    break StopReason::Done;
                }
                Err(e) => {
                    warn!(tab = %tab, error = %e, "lost the page after a step");
                    guard.update(|run| run.actions_taken += 1);
                    break StopReason::SnapshotLost;
                }
            };
            self.explore(&tab, &fresh);

            let request = NextRequest {
                last_step: step.clone(),
                dom: fresh.controls.clone(),
                current_url: fresh.url.clone(),
                prompt: prompt.to_string(),
            };
            let suggested = match self.planner.next(&request).await {
                Ok(steps) => steps,
                Err(e) => {
                    warn!(tab = %tab, error = %e, "next-step request failed");
                    self.emit(
                        &tab,
                        AutomationEvent::PlannerFailed {
                            stage: "next".into(),
                            error: e.to_string(),
                        },
                    );
                    Vec::new()
                }
            };

            // The planner has seen the `done`; its suggestions are not queued.
            if goal_reached {
                self.emit_steps(guard);
                break StopReason::Done;
            }

            let received = suggested.len();
            let rewrite = RewriteContext::from(&fresh);
            let suggested: Vec<Step> = suggested
                .into_iter()
                .map(|s| self.rules.apply(s, &rewrite))
                .collect();
            let page_unchanged = snapshot.fingerprint() == fresh.fingerprint();
            let (kept, synthesized_enter) = guard
                .update(|run| {
                    let (kept, synthesized) =
                        filter_suggestions(&run.recent_signatures, &step, page_unchanged, suggested);
                    run.prepend(kept.clone());
                    run.actions_taken += 1;
                    (kept, synthesized)
                })
                .unwrap_or_default();

            debug!(tab = %tab, received, kept = kept.len(), synthesized_enter, "suggestions merged");
            self.emit(
                &tab,
                AutomationEvent::Suggestions {
                    received,
                    kept: kept.len(),
                    synthesized_enter,
                },
            );
            self.emit_steps(guard);
            snapshot = fresh;
        };

        let (actions_taken, executed) = guard
            .read(|run| (run.actions_taken, run.executed_steps.clone()))
            .unwrap_or_default();
        RunSummary {
            actions_taken,
            skipped,
            executed,
            reason,
        }
    }

    /// Fresh snapshot; one retry after waiting for the document.
    async fn observe(&self, page: &dyn PageTrait) -> Result<Snapshot> {
        match self.snapshots.capture(page).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                debug!(error = %e, "snapshot failed, waiting for the document");
                self.wait_for_document(page).await;
                self.snapshots.capture(page).await
            }
        }
    }

    /// Bounded wait for `document.readyState == "complete"`. Errors while
    /// the old document is torn down count as "not yet".
    async fn wait_for_document(&self, page: &dyn PageTrait) {
        let complete = poll_until(
            self.config.navigation_settle_timeout(),
            self.config.poll_interval(),
            move || async move { Ok(matches!(page.ready_state().await.as_deref(), Ok("complete"))) },
        )
        .await
        .unwrap_or(false);
        if !complete {
            debug!("document did not finish loading in time");
        }
    }

    /// Detached link report; its outcome is only logged.
    fn explore(&self, tab: &TabId, snapshot: &Snapshot) {
        if !self.config.explore_links || snapshot.links.is_empty() {
            return;
        }
        let planner = Arc::clone(&self.planner);
        let request = ExploreRequest {
            current_url: snapshot.url.clone(),
            links: snapshot.links.clone(),
        };
        let tab = tab.clone();
        tokio::spawn(async move {
            if let Err(e) = planner.explore(&request).await {
                debug!(tab = %tab, error = %e, "explore failed");
            }
        });
    }
}
