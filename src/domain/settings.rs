//! Per-layer governance configuration.
//!
//! Configuration is only changed through typed patches applied by the
//! orchestrator. Structural rule sets are always filtered against the
//! active framework before they are stored.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::framework::GovernanceLayer;

/// Ordered qualitative knob used by several layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualitativeStrength {
    Low,
    Balanced,
    High,
}

impl Default for QualitativeStrength {
    fn default() -> Self {
        Self::Balanced
    }
}

impl fmt::Display for QualitativeStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualitativeStrength::Low => "Low",
            QualitativeStrength::Balanced => "Balanced",
            QualitativeStrength::High => "High",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for QualitativeStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "balanced" => Ok(Self::Balanced),
            "high" => Ok(Self::High),
            other => Err(format!("unknown strength '{}' (expected low, balanced or high)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralConfig {
    /// Active rule ids; always a subset of the framework's Structural rules
    pub active_rules: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicConfig {
    pub coherence_strength: QualitativeStrength,
    pub archetype_projection: bool,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            coherence_strength: QualitativeStrength::Balanced,
            archetype_projection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhenomenologicalConfig {
    pub affective_congruence_target: QualitativeStrength,
    pub resonance_tracking: bool,
}

impl Default for PhenomenologicalConfig {
    fn default() -> Self {
        Self {
            affective_congruence_target: QualitativeStrength::Balanced,
            resonance_tracking: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub injection_sensitivity: QualitativeStrength,
    /// Gates the breach-simulation entry point only
    pub simulation_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            injection_sensitivity: QualitativeStrength::High,
            simulation_enabled: true,
        }
    }
}

/// One record per governance layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub structural: StructuralConfig,
    pub symbolic: SymbolicConfig,
    pub phenomenological: PhenomenologicalConfig,
    pub security: SecurityConfig,
}

impl GovernanceConfig {
    /// Shallow-merge a patch into the matching layer.
    ///
    /// Structural rule ids outside `allowed_rules` are dropped. Returns a
    /// `field: value` line per field the patch set.
    pub fn apply(&mut self, patch: &ConfigPatch, allowed_rules: &BTreeSet<String>) -> Vec<String> {
        let mut changes = Vec::new();

        match patch {
            ConfigPatch::Structural(p) => {
                if let Some(ref rules) = p.active_rules {
                    let filtered: BTreeSet<String> =
                        rules.intersection(allowed_rules).cloned().collect();
                    changes.push(format!(
                        "active_rules: [{}]",
                        filtered.iter().cloned().collect::<Vec<_>>().join(", ")
                    ));
                    self.structural.active_rules = filtered;
                }
            }
            ConfigPatch::Symbolic(p) => {
                if let Some(strength) = p.coherence_strength {
                    self.symbolic.coherence_strength = strength;
                    changes.push(format!("coherence_strength: {}", strength));
                }
                if let Some(enabled) = p.archetype_projection {
                    self.symbolic.archetype_projection = enabled;
                    changes.push(format!("archetype_projection: {}", enabled));
                }
            }
            ConfigPatch::Phenomenological(p) => {
                if let Some(target) = p.affective_congruence_target {
                    self.phenomenological.affective_congruence_target = target;
                    changes.push(format!("affective_congruence_target: {}", target));
                }
                if let Some(enabled) = p.resonance_tracking {
                    self.phenomenological.resonance_tracking = enabled;
                    changes.push(format!("resonance_tracking: {}", enabled));
                }
            }
            ConfigPatch::Security(p) => {
                if let Some(sensitivity) = p.injection_sensitivity {
                    self.security.injection_sensitivity = sensitivity;
                    changes.push(format!("injection_sensitivity: {}", sensitivity));
                }
                if let Some(enabled) = p.simulation_enabled {
                    self.security.simulation_enabled = enabled;
                    changes.push(format!("simulation_enabled: {}", enabled));
                }
            }
        }

        changes
    }
}

/// Partial update for a single layer; unset fields keep their value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layer")]
pub enum ConfigPatch {
    Structural(StructuralPatch),
    Symbolic(SymbolicPatch),
    Phenomenological(PhenomenologicalPatch),
    Security(SecurityPatch),
}

impl ConfigPatch {
    /// The layer this patch targets
    pub fn layer(&self) -> GovernanceLayer {
        match self {
            ConfigPatch::Structural(_) => GovernanceLayer::Structural,
            ConfigPatch::Symbolic(_) => GovernanceLayer::Symbolic,
            ConfigPatch::Phenomenological(_) => GovernanceLayer::Phenomenological,
            ConfigPatch::Security(_) => GovernanceLayer::Security,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralPatch {
    pub active_rules: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolicPatch {
    pub coherence_strength: Option<QualitativeStrength>,
    pub archetype_projection: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenomenologicalPatch {
    pub affective_congruence_target: Option<QualitativeStrength>,
    pub resonance_tracking: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPatch {
    pub injection_sensitivity: Option<QualitativeStrength>,
    pub simulation_enabled: Option<bool>,
}
