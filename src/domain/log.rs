//! Audit log entries.
//!
//! Entries are immutable once appended to the audit log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::framework::GovernanceLayer;

/// Module that produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    Structural,
    Symbolic,
    Phenomenological,
    Security,
    System,
    User,
    #[serde(rename = "LLM")]
    Llm,
}

impl From<GovernanceLayer> for Module {
    fn from(layer: GovernanceLayer) -> Self {
        match layer {
            GovernanceLayer::Structural => Module::Structural,
            GovernanceLayer::Symbolic => Module::Symbolic,
            GovernanceLayer::Phenomenological => Module::Phenomenological,
            GovernanceLayer::Security => Module::Security,
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Module::Structural => "Structural",
            Module::Symbolic => "Symbolic",
            Module::Phenomenological => "Phenomenological",
            Module::Security => "Security",
            Module::System => "System",
            Module::User => "User",
            Module::Llm => "LLM",
        };
        f.write_str(name)
    }
}

/// A single entry in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// When this entry was appended (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// Seconds since the current run started (0 outside a run)
    pub time_offset: f64,

    /// Originating module
    pub module: Module,

    /// Short event label, e.g. "Scan Clear"
    pub event: String,

    /// Free-text details
    pub details: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Hex SHA-256 chained over the previous entry's digest
    #[serde(default)]
    pub digest: String,
}

impl LogEntry {
    /// Create an unsealed entry; the audit log fills offset and digest on append
    pub fn new(module: Module, event: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            time_offset: 0.0,
            module,
            event: event.into(),
            details: details.into(),
            metadata: None,
            digest: String::new(),
        }
    }

    /// Attach structured metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this is an error entry
    pub fn is_error(&self) -> bool {
        self.event == "Error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_module_serializes_uppercase() {
        let entry = LogEntry::new(Module::Llm, "Generation", "Requesting raw output...");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["module"], "LLM");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_entry_with_metadata() {
        let entry = LogEntry::new(Module::Security, "Injection Detected", "flagged")
            .with_metadata(serde_json::json!({ "segment": "exploit" }));

        assert_eq!(entry.metadata.unwrap()["segment"], "exploit");
        assert_eq!(Module::from(GovernanceLayer::Security), Module::Security);
    }
}
