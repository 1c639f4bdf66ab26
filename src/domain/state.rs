//! Aggregate application state published to subscribers.
//!
//! `AppState` is owned and mutated exclusively by the orchestrator. Every
//! subscriber receives it as an immutable snapshot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::AuditLog;

use super::framework::Framework;
use super::report::IntrospectionReport;
use super::settings::GovernanceConfig;

/// Progress step before any framework is selected
pub const STEP_FLOOR: u8 = 1;
/// Progress step after a framework is loaded
pub const STEP_FRAMEWORK_LOADED: u8 = 2;
/// Progress step once the user starts configuring
pub const STEP_CONFIGURING: u8 = 3;
/// Progress step while executing or after execution
pub const STEP_EXECUTING: u8 = 4;

/// Engine view the user is focused on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Lattice,
    Varkiel,
    WildCore,
}

impl Default for Domain {
    fn default() -> Self {
        Self::Lattice
    }
}

/// Ordered phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generation,
    Security,
    Structural,
    Symbolic,
    Phenomenological,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generation => "generation",
            Stage::Security => "security",
            Stage::Structural => "structural",
            Stage::Symbolic => "symbolic",
            Stage::Phenomenological => "phenomenological",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Lifecycle of the most recent run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunStatus {
    /// No run has started since the last reset
    Idle,

    /// A stage is executing
    Running { stage: Stage },

    /// Completed successfully
    Complete,

    /// Failed with error
    Failed { error: String },
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// Transient run bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,

    /// Wall-clock start of the current run
    pub started_at: Option<DateTime<Utc>>,

    /// Output accumulated so far by the current run
    pub partial_output: String,

    /// Wizard progress; only increases within a framework selection
    pub progress_step: u8,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            started_at: None,
            partial_output: String::new(),
            progress_step: STEP_FLOOR,
        }
    }
}

impl RunState {
    /// Raise the progress step, never lowering it
    pub fn advance_to(&mut self, step: u8) {
        self.progress_step = self.progress_step.max(step);
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running { .. })
    }
}

/// Final text of a run, optionally with a highlighted span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalOutput {
    Text(String),
    Highlighted { text: String, highlight: String },
}

impl FinalOutput {
    pub fn text(&self) -> &str {
        match self {
            FinalOutput::Text(text) => text,
            FinalOutput::Highlighted { text, .. } => text,
        }
    }

    pub fn highlight(&self) -> Option<&str> {
        match self {
            FinalOutput::Text(_) => None,
            FinalOutput::Highlighted { highlight, .. } => Some(highlight),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub group: String,
    pub strength: f64,
}

impl GraphNode {
    pub fn new(id: &str, label: &str, group: &str, strength: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            group: group.to_string(),
            strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl GraphLink {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            value: 1.0,
        }
    }
}

/// Directed concept graph built by the Symbolic stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// One sample of the affective trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectiveDataPoint {
    pub id: String,
    pub time: u32,
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
}

/// Aggregate root owned by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub active_framework: Option<Framework>,
    pub active_domain: Domain,
    pub prompt: String,
    pub config: GovernanceConfig,
    pub logs: AuditLog,
    pub run: RunState,
    pub final_output: Option<FinalOutput>,
    pub introspection_report: Option<IntrospectionReport>,
    pub graph_data: GraphData,
    pub affective_data: Vec<AffectiveDataPoint>,
    pub error: Option<String>,
}

impl AppState {
    /// Fresh state: no framework, empty log, default configuration
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Whether a run is in flight
    pub fn is_loading(&self) -> bool {
        self.run.is_running()
    }
}
