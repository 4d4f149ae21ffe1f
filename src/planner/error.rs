use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("planner request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("planner returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("planner response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid planner base URL: {0}")]
    InvalidBaseUrl(String),
}

impl PlannerError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PlannerError::Http { status, .. } => Some(*status),
            PlannerError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
