//! Core orchestration logic.
//!
//! This module contains:
//! - AuditLog: Append-only, hash-chained log of stage activity
//! - Scanner: Injection pattern matching for the Security stage
//! - Pacing: Injectable delays between stages
//! - Subscribers: Snapshot fan-out to observers
//! - Orchestrator: State machine and stage sequencer

pub mod analysis;
pub mod audit_log;
pub mod error;
pub mod orchestrator;
pub mod pacing;
pub mod scanner;
pub mod subscribers;

// Re-export commonly used types
pub use audit_log::{chain_digest, AuditChainError, AuditLog};
pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, REDACTION_NOTICE, SIMULATION_PASSED};
pub use pacing::StagePacing;
pub use scanner::{InjectionPattern, PatternScanner, ScanMatch, ScannerError};
pub use subscribers::{Subscriber, SubscriberId, SubscriberRegistry};
