//! End-of-run introspection report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a single stage contributed to the final output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: String,
    pub name: String,
    pub contribution: String,
}

impl Contributor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        contribution: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contribution: contribution.into(),
        }
    }
}

/// Produced once per successfully completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionReport {
    pub id: Uuid,

    /// Id of the framework the run used
    pub framework: String,

    pub timestamp: DateTime<Utc>,

    /// One record per stage that shaped the output, in stage order
    pub contributors: Vec<Contributor>,

    pub summary: String,
}

impl IntrospectionReport {
    pub fn new(framework: String, contributors: Vec<Contributor>, summary: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            framework,
            timestamp: Utc::now(),
            contributors,
            summary,
        }
    }

    /// Find a contributor by id
    pub fn contributor(&self, id: &str) -> Option<&Contributor> {
        self.contributors.iter().find(|c| c.id == id)
    }
}
