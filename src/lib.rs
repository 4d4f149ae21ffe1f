pub mod actions;
pub mod bridge;
pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod planner;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod utils;

pub use actions::{ActionExecutor, Step};
pub use bridge::{BackgroundHost, BridgeClient, BridgeReply, BridgeRequest};
pub use browser::TabRegistry;
#[cfg(feature = "chrome")]
pub use browser::{ChromeBrowser, ChromePage};
pub use crate::core::{BrowserTrait, Config, PageTrait};
pub use dom::{DomElement, ElementResolver, Snapshot, SnapshotProducer};
pub use errors::{AgentError, Result};
pub use orchestrator::{AutomationEvent, EventEnvelope, EventRecorder, Orchestrator, RunReport};
pub use planner::{Planner, PlannerError, PlanningClient};
pub use state::TabStateStore;
pub use types::*;
