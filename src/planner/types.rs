use crate::actions::Step;
use crate::dom::ControlDescriptor;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub prompt: String,
    pub dom: Vec<ControlDescriptor>,
    pub start_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextRequest {
    pub last_step: Step,
    pub dom: Vec<ControlDescriptor>,
    pub current_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreRequest {
    pub current_url: String,
    pub links: Vec<String>,
}

/// `{steps}`; a missing or null list means no steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub steps: Vec<Step>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Step>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Step>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub task: String,
    pub context: SummaryContext,
}

/// What the page looks like to the summarizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryContext {
    pub url: String,
    pub title: String,
    pub text: String,
    pub headings: Vec<String>,
    pub dom: Vec<ControlDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBookmarkRequest {
    pub name: String,
}
