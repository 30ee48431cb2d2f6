use thiserror::Error;

#[derive(Debug, Error)]
pub enum WellnessError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream error after {attempts} attempt(s): {message}")]
    Upstream { attempts: u32, message: String },

    #[error("generated plan for days {start}-{end} failed structure validation after retry")]
    StructureValidation { start: u32, end: u32 },

    #[error("generated plan is incomplete: {found} of 14 days parsed")]
    IncompletePlan { found: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("invalid assessment: {0}")]
    InvalidAssessment(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

impl WellnessError {
    /// True for failures of the generation pipeline itself, as opposed to
    /// storage or input problems.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            WellnessError::Upstream { .. }
                | WellnessError::StructureValidation { .. }
                | WellnessError::IncompletePlan { .. }
        )
    }
}

impl From<serde_json::Error> for WellnessError {
    fn from(err: serde_json::Error) -> Self {
        WellnessError::Corrupt(err.to_string())
    }
}

impl From<reqwest::Error> for WellnessError {
    fn from(err: reqwest::Error) -> Self {
        WellnessError::Transport(err.to_string())
    }
}

pub type Result<T, E = WellnessError> = std::result::Result<T, E>;
