//! Inbound commands accepted by the orchestrator.

use serde::{Deserialize, Serialize};

use super::settings::ConfigPatch;
use super::state::Domain;

/// Closed set of actions the orchestrator reduces over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// Load a catalog framework into a fresh state
    SelectFramework(String),

    /// Return to the baseline state
    ResetFramework,

    /// Replace the pending prompt
    SetPrompt(String),

    /// Focus an engine view
    SetActiveDomain(Domain),

    /// Merge a partial layer configuration
    UpdateConfig(ConfigPatch),

    /// Replace the Structural rule set from a declarative document
    /// (`{"constraints": [...]}`)
    ApplyDeclarativeSpec(serde_json::Value),

    /// Run the full governance pipeline
    ExecuteNarrative(String),

    /// Run only the Security scan against adversarial input
    ExecuteBreachSimulation(String),
}

impl Action {
    /// Short name used in tracing spans
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectFramework(_) => "select_framework",
            Action::ResetFramework => "reset_framework",
            Action::SetPrompt(_) => "set_prompt",
            Action::SetActiveDomain(_) => "set_active_domain",
            Action::UpdateConfig(_) => "update_config",
            Action::ApplyDeclarativeSpec(_) => "apply_declarative_spec",
            Action::ExecuteNarrative(_) => "execute_narrative",
            Action::ExecuteBreachSimulation(_) => "execute_breach_simulation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_shape() {
        let action: Action = serde_json::from_str(
            r#"{"type":"apply_declarative_spec","payload":{"constraints":["PRINCIPLE_1"]}}"#,
        )
        .unwrap();

        match action {
            Action::ApplyDeclarativeSpec(spec) => {
                assert_eq!(spec["constraints"][0], "PRINCIPLE_1");
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let reset: Action = serde_json::from_str(r#"{"type":"reset_framework"}"#).unwrap();
        assert_eq!(reset, Action::ResetFramework);
    }
}
