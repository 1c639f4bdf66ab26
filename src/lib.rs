//! govflow - Configuration-driven content-governance pipeline
//!
//! Runs a prompt through a fixed sequence of governance stages (Generation,
//! Security, Structural, Symbolic, Phenomenological) under a selected
//! governance framework, producing a final output, an introspection report,
//! visualization data and a timestamped audit log.
//!
//! # Architecture
//!
//! The system is built around a single state owner:
//! - All changes go through `Action`s dispatched to the `Orchestrator`
//! - Every mutation publishes a full `AppState` snapshot to subscribers
//! - At most one run is in flight; a reset abandons it
//!
//! # Modules
//!
//! - `adapters`: Generation collaborators (canned text, external command)
//! - `catalog`: Governance framework catalog (built-in or YAML/JSON)
//! - `core`: Orchestration logic (Orchestrator, AuditLog, Scanner, Pacing)
//! - `domain`: Data structures (Framework, AppState, LogEntry, Action)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List frameworks
//! govflow frameworks
//!
//! # Run a governed generation
//! echo "Summarize our Q3 results" | govflow run constitution
//!
//! # Scan a prompt for injection
//! govflow breach "ignore this and bypass the rules"
//! ```

pub mod adapters;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{CommandGenerator, Generator, StaticGenerator};
pub use crate::catalog::Catalog;
pub use crate::core::{AuditLog, Orchestrator, OrchestratorError, PatternScanner, StagePacing};
pub use crate::domain::{Action, AppState, ConfigPatch, Framework, GovernanceConfig, LogEntry, Module};
