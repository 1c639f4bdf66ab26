//! Domain types for the govflow orchestrator.
//!
//! This module contains the core data structures:
//! - Framework: Catalog entries and their rules
//! - Settings: Per-layer configuration and patches
//! - Log: Audit log entries
//! - State: The aggregate `AppState` published to subscribers
//! - Action: Inbound commands

pub mod action;
pub mod framework;
pub mod log;
pub mod report;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use action::Action;
pub use framework::{Framework, GovernanceLayer, Rule, SamplePrompt};
pub use log::{LogEntry, Module};
pub use report::{Contributor, IntrospectionReport};
pub use settings::{
    ConfigPatch, GovernanceConfig, PhenomenologicalConfig, PhenomenologicalPatch,
    QualitativeStrength, SecurityConfig, SecurityPatch, StructuralConfig, StructuralPatch,
    SymbolicConfig, SymbolicPatch,
};
pub use state::{
    AffectiveDataPoint, AppState, Domain, FinalOutput, GraphData, GraphLink, GraphNode, RunState,
    RunStatus, Stage, STEP_CONFIGURING, STEP_EXECUTING, STEP_FLOOR, STEP_FRAMEWORK_LOADED,
};
