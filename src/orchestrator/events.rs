use crate::actions::Step;
use crate::state::TabStateStore;
use crate::types::TabId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Done,
    QueueEmpty,
    BudgetExhausted,
    SnapshotLost,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Done => "goal reached",
            StopReason::QueueEmpty => "no more steps",
            StopReason::BudgetExhausted => "action budget exhausted",
            StopReason::SnapshotLost => "page stopped answering",
        })
    }
}

/// Progress of a run, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AutomationEvent {
    Started { prompt: String },
    StartFailed { reason: String },
    Planned { steps: usize },
    StepStarted { step: Step },
    StepSkipped { step: Step },
    StepFailed { step: Step, error: String },
    Suggestions { received: usize, kept: usize, synthesized_enter: bool },
    PlannerFailed { stage: String, error: String },
    Steps { executed: Vec<Step>, queued: Vec<Step> },
    Finished { actions_taken: usize, reason: StopReason },
}

impl AutomationEvent {
    /// One line of log text; `None` for events that only carry data.
    pub fn describe(&self) -> Option<String> {
        let line = match self {
            AutomationEvent::Started { prompt } => format!("Automation: {}", prompt),
            AutomationEvent::StartFailed { reason } => format!("Automation did not start: {}", reason),
            AutomationEvent::Planned { steps: 0 } => "Planner returned no steps".to_string(),
            AutomationEvent::Planned { steps } => format!("Planned {} step(s)", steps),
            AutomationEvent::StepStarted { step } => step.to_string(),
            AutomationEvent::StepSkipped { step } => format!("Skipped duplicate step: {}", step),
            AutomationEvent::StepFailed { error, .. } => format!("action failed: {}", error),
            AutomationEvent::Suggestions { received: 0, .. } => "Planner returned nothing".to_string(),
            AutomationEvent::Suggestions {
                received,
                kept: 0,
                synthesized_enter: false,
            } => format!("All {} suggestion(s) were repeats", received),
            AutomationEvent::Suggestions {
                received,
                kept,
                synthesized_enter,
            } => {
                let mut line = format!("Queued {} of {} suggestion(s)", kept, received);
                if *synthesized_enter {
                    line.push_str(" (press Enter instead of retyping)");
                }
                line
            }
            AutomationEvent::PlannerFailed { stage, error } => {
                format!("Planner /{} failed: {}", stage, error)
            }
            AutomationEvent::Steps { .. } => return None,
            AutomationEvent::Finished {
                actions_taken,
                reason,
            } => format!("Finished after {} action(s): {}", actions_taken, reason),
        };
        Some(line)
    }

    /// CSS class the panel styles the line with.
    pub fn class(&self) -> &'static str {
        match self {
            AutomationEvent::StartFailed { .. }
            | AutomationEvent::StepFailed { .. }
            | AutomationEvent::PlannerFailed { .. } => "err",
            AutomationEvent::StepSkipped { .. } | AutomationEvent::Suggestions { .. } => "muted",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub tab: TabId,
    pub at: DateTime<Utc>,
    pub event: AutomationEvent,
}

impl EventEnvelope {
    pub fn new(tab: TabId, event: AutomationEvent) -> Self {
        Self {
            tab,
            at: Utc::now(),
            event,
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Mirrors automation events into the tab's panel state, so a panel that
/// remounts after navigation shows the run's log and steps.
pub struct EventRecorder;

impl EventRecorder {
    pub fn record(store: &TabStateStore, envelope: &EventEnvelope) {
        match &envelope.event {
            AutomationEvent::Steps { executed, queued } => {
                let all: Vec<&Step> = executed.iter().chain(queued.iter()).collect();
                match serde_json::to_string_pretty(&all) {
                    Ok(json) => store.update_panel(&envelope.tab, |panel| panel.steps_json = json),
                    Err(e) => warn!(tab = %envelope.tab, error = %e, "cannot serialize steps"),
                }
            }
            event => {
                let Some(line) = event.describe() else {
                    return;
                };
                let html = format!(
                    "<div class=\"{}\">{}</div>",
                    event.class(),
                    escape_html(&line)
                );
                store.update_panel(&envelope.tab, |panel| {
                    panel.append_log(&html);
                    if let AutomationEvent::Finished { .. } = event {
                        panel.result_html = html.clone();
                    }
                });
            }
        }
    }

    /// Records every event from `events` until the channel closes.
    pub fn spawn(
        store: Arc<TabStateStore>,
        mut events: broadcast::Receiver<EventEnvelope>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(envelope) => Self::record(&store, &envelope),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "event recorder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("event recorder stopped");
        })
    }
}
