//! Errors returned by orchestrator actions.

use thiserror::Error;

/// Rejected or failed action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("Unknown framework: {0}")]
    UnknownFramework(String),

    #[error("Malformed declarative spec: {0}")]
    MalformedSpec(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("A run is already in progress")]
    RunAlreadyInProgress,

    #[error("Breach simulation is disabled in the Security configuration")]
    SimulationDisabled,
}

impl OrchestratorError {
    /// Validation errors are handled locally and never fail a run
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrchestratorError::UnknownFramework(_) | OrchestratorError::MalformedSpec(_)
        )
    }
}
