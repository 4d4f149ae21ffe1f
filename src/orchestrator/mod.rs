pub mod events;
pub mod rules;
pub mod runner;
pub mod signature;

pub use events::{escape_html, AutomationEvent, EventEnvelope, EventRecorder, StopReason};
pub use rules::{AmazonSearchBox, RewriteContext, RewriteRule, RewriteRules, TypeIntoTextbox};
pub use runner::{filter_suggestions, Orchestrator, RunReport, RunSummary, StartFailure};
pub use signature::{SignatureTarget, StepSignature};
