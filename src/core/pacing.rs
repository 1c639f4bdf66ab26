//! Stage pacing delays.
//!
//! Delays between stages are explicit and injectable so tests can drive the
//! state machine without real sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Stage;

/// Per-stage delay applied before the stage does its work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePacing {
    /// Delay before calling the generation collaborator
    #[serde(default = "default_generation_delay")]
    pub generation_ms: u64,

    /// Delay before the Security scan
    #[serde(default = "default_security_delay")]
    pub security_ms: u64,

    /// Delay before enforcing Structural rules
    #[serde(default = "default_structural_delay")]
    pub structural_ms: u64,

    /// Delay before building the Symbolic graph
    #[serde(default = "default_symbolic_delay")]
    pub symbolic_ms: u64,

    /// Delay before tracking Phenomenological resonance
    #[serde(default = "default_phenomenological_delay")]
    pub phenomenological_ms: u64,

    /// Delay inside a breach simulation
    #[serde(default = "default_breach_delay")]
    pub breach_simulation_ms: u64,
}

fn default_generation_delay() -> u64 {
    200
}
fn default_security_delay() -> u64 {
    300
}
fn default_structural_delay() -> u64 {
    400
}
fn default_symbolic_delay() -> u64 {
    500
}
fn default_phenomenological_delay() -> u64 {
    500
}
fn default_breach_delay() -> u64 {
    500
}

impl Default for StagePacing {
    fn default() -> Self {
        Self {
            generation_ms: default_generation_delay(),
            security_ms: default_security_delay(),
            structural_ms: default_structural_delay(),
            symbolic_ms: default_symbolic_delay(),
            phenomenological_ms: default_phenomenological_delay(),
            breach_simulation_ms: default_breach_delay(),
        }
    }
}

impl StagePacing {
    /// No delays at all
    pub fn none() -> Self {
        Self {
            generation_ms: 0,
            security_ms: 0,
            structural_ms: 0,
            symbolic_ms: 0,
            phenomenological_ms: 0,
            breach_simulation_ms: 0,
        }
    }

    /// Delay before a pipeline stage
    pub fn delay_for(&self, stage: Stage) -> Duration {
        let ms = match stage {
            Stage::Generation => self.generation_ms,
            Stage::Security => self.security_ms,
            Stage::Structural => self.structural_ms,
            Stage::Symbolic => self.symbolic_ms,
            Stage::Phenomenological => self.phenomenological_ms,
            Stage::Finalize => 0,
        };
        Duration::from_millis(ms)
    }

    /// Delay inside a breach simulation
    pub fn breach_delay(&self) -> Duration {
        Duration::from_millis(self.breach_simulation_ms)
    }

    /// Sum of all pipeline stage delays
    pub fn total_pipeline(&self) -> Duration {
        [
            Stage::Generation,
            Stage::Security,
            Stage::Structural,
            Stage::Symbolic,
            Stage::Phenomenological,
        ]
        .into_iter()
        .map(|s| self.delay_for(s))
        .sum()
    }
}

/// Sleep for `delay` unless it is zero
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
