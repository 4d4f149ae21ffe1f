pub mod client;
pub mod error;
pub mod types;

pub use client::PlanningClient;
pub use error::PlannerError;
pub use types::{
    ExploreRequest, NextRequest, PlanRequest, RunBookmarkRequest, StepsResponse, SummarizeRequest,
    SummaryContext, SummaryResponse,
};

use crate::actions::Step;
use async_trait::async_trait;

/// The planning service as the control loop sees it
#[async_trait]
pub trait Planner: Send + Sync {
    /// Initial plan for a goal
    async fn plan(&self, request: &PlanRequest) -> Result<Vec<Step>, PlannerError>;

    /// Continuation after one executed step
    async fn next(&self, request: &NextRequest) -> Result<Vec<Step>, PlannerError>;

    /// Passive link discovery; the response carries nothing
    async fn explore(&self, request: &ExploreRequest) -> Result<(), PlannerError>;
}
