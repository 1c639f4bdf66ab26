//! Governance catalog.
//!
//! The catalog is the read-only table of frameworks the orchestrator can
//! select from. It is either the built-in set or loaded from a YAML or JSON
//! file:
//!
//! ```yaml
//! frameworks:
//!   - id: house-style
//!     title: House Style
//!     rules:
//!       - id: STYLE_1
//!         name: Plain Language
//!         description: Prefer short sentences
//!         layer: Structural
//! ```

mod builtin;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::Framework;

/// Ordered table of frameworks keyed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub frameworks: Vec<Framework>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Catalog with the frameworks shipped in the binary
    pub fn builtin() -> Self {
        Self {
            frameworks: builtin::frameworks(),
        }
    }

    /// Build a catalog from frameworks, validating it
    pub fn new(frameworks: Vec<Framework>) -> Result<Self> {
        let catalog = Self { frameworks };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(content).context("Failed to parse catalog YAML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from JSON content
    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(content).context("Failed to parse catalog JSON")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file; `.json` is parsed as JSON, anything else as YAML
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        parsed.with_context(|| format!("Invalid catalog: {}", path.display()))
    }

    /// Check ids are present and unique
    pub fn validate(&self) -> Result<()> {
        let mut framework_ids = HashSet::new();

        for framework in &self.frameworks {
            if framework.id.trim().is_empty() {
                anyhow::bail!("Framework '{}' has an empty id", framework.title);
            }
            if !framework_ids.insert(framework.id.as_str()) {
                anyhow::bail!("Duplicate framework id '{}'", framework.id);
            }

            let mut rule_ids = HashSet::new();
            for (i, rule) in framework.rules.iter().enumerate() {
                if rule.id.trim().is_empty() {
                    anyhow::bail!("Rule {} of framework '{}' has an empty id", i, framework.id);
                }
                if !rule_ids.insert(rule.id.as_str()) {
                    anyhow::bail!(
                        "Duplicate rule id '{}' in framework '{}'",
                        rule.id,
                        framework.id
                    );
                }
            }
        }

        Ok(())
    }

    /// Get a framework by id
    pub fn get(&self, id: &str) -> Option<&Framework> {
        self.frameworks.iter().find(|f| f.id == id)
    }

    /// Framework ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.frameworks.iter().map(|f| f.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.frameworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }
}
