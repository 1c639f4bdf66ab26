//! Governance frameworks and their rules.
//!
//! A framework is an immutable catalog entry. Rules belong to exactly one
//! governance layer and are never mutated after the catalog is loaded.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four governance layers a rule or setting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GovernanceLayer {
    Structural,
    Symbolic,
    Phenomenological,
    Security,
}

impl GovernanceLayer {
    /// All layers in pipeline order
    pub const ALL: [GovernanceLayer; 4] = [
        GovernanceLayer::Structural,
        GovernanceLayer::Symbolic,
        GovernanceLayer::Phenomenological,
        GovernanceLayer::Security,
    ];

    /// Display name of the engine that implements this layer
    pub fn engine_name(&self) -> &'static str {
        match self {
            GovernanceLayer::Structural => "Constraint Lattice",
            GovernanceLayer::Symbolic | GovernanceLayer::Phenomenological => "Varkiel",
            GovernanceLayer::Security => "WildCore",
        }
    }
}

impl fmt::Display for GovernanceLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GovernanceLayer::Structural => "Structural",
            GovernanceLayer::Symbolic => "Symbolic",
            GovernanceLayer::Phenomenological => "Phenomenological",
            GovernanceLayer::Security => "Security",
        };
        f.write_str(name)
    }
}

/// A single named constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier (unique within a framework)
    pub id: String,

    /// Display name
    pub name: String,

    /// What the rule enforces
    pub description: String,

    /// Layer this rule belongs to
    pub layer: GovernanceLayer,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        layer: GovernanceLayer,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            layer,
        }
    }
}

/// A suggested prompt shipped with a framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePrompt {
    pub id: String,
    pub text: String,
}

/// An immutable rule set used as the constraint context of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    /// Catalog key
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Where the framework text comes from
    #[serde(default)]
    pub source: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Suggested prompts; the first one seeds the prompt on selection
    #[serde(default)]
    pub sample_prompts: Vec<SamplePrompt>,

    /// Ordered rules across all layers
    pub rules: Vec<Rule>,
}

impl Framework {
    /// Rules belonging to a layer, in catalog order
    pub fn rules_in(&self, layer: GovernanceLayer) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.layer == layer)
    }

    /// Ids of every Structural rule
    pub fn structural_rule_ids(&self) -> BTreeSet<String> {
        self.rules_in(GovernanceLayer::Structural)
            .map(|r| r.id.clone())
            .collect()
    }

    /// First sample prompt, if any
    pub fn first_sample_prompt(&self) -> Option<&str> {
        self.sample_prompts.first().map(|p| p.text.as_str())
    }
}
