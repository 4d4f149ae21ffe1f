use crate::actions::Step;
use crate::orchestrator::StepSignature;
use crate::state::TimeWindowedSet;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Control-loop state of one tab's active run.
#[derive(Debug, Clone)]
pub struct RunState {
    pub prompt: String,
    pub queue: VecDeque<Step>,
    pub executed_steps: Vec<Step>,
    pub recent_signatures: TimeWindowedSet<StepSignature>,
    pub actions_taken: usize,
    pub running: bool,
    pub started_at: DateTime<Utc>,
}

impl RunState {
    pub fn new(prompt: impl Into<String>, dedupe_window: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            queue: VecDeque::new(),
            executed_steps: Vec::new(),
            recent_signatures: TimeWindowedSet::new(dedupe_window),
            actions_taken: 0,
            running: true,
            started_at: Utc::now(),
        }
    }

    pub fn pop_front(&mut self) -> Option<Step> {
        self.queue.pop_front()
    }

    /// Puts `steps` ahead of everything queued, keeping their order.
    pub fn prepend(&mut self, steps: Vec<Step>) {
        for step in steps.into_iter().rev() {
            self.queue.push_front(step);
        }
    }

    pub fn is_recent(&self, signature: &StepSignature) -> bool {
        self.recent_signatures.contains(signature)
    }

    /// Records `signature` as just executed and forgets expired ones.
    pub fn remember(&mut self, signature: StepSignature) {
        self.recent_signatures.prune();
        self.recent_signatures.insert(signature);
    }

    pub fn queued(&self) -> Vec<Step> {
        self.queue.iter().cloned().collect()
    }
}
