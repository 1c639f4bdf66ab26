//! Configuration Integration Tests
//!
//! Tests for config patches, declarative specs and the invariant that the
//! active Structural rules always belong to the selected framework.

use std::collections::BTreeSet;
use std::sync::Arc;

use govflow::adapters::StaticGenerator;
use govflow::catalog::Catalog;
use govflow::core::{Orchestrator, OrchestratorError, StagePacing};
use govflow::domain::{
    Action, ConfigPatch, Domain, GovernanceLayer, Module, QualitativeStrength, StructuralPatch,
    SymbolicPatch, STEP_CONFIGURING, STEP_FRAMEWORK_LOADED,
};
use serde_json::json;

fn orchestrator() -> Orchestrator {
    Orchestrator::builder(Catalog::builtin(), Arc::new(StaticGenerator::default()))
        .pacing(StagePacing::none())
        .build()
}

async fn select(orch: &Orchestrator, id: &str) {
    orch.dispatch(Action::SelectFramework(id.to_string()))
        .await
        .unwrap();
}

fn rule_set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Active rules must be a subset of the framework's Structural rule ids
fn assert_subset_invariant(orch: &Orchestrator) {
    let state = orch.snapshot();
    let allowed = state
        .active_framework
        .as_ref()
        .map(|f| f.structural_rule_ids())
        .unwrap_or_default();
    assert!(
        state.config.structural.active_rules.is_subset(&allowed),
        "{:?} is not a subset of {:?}",
        state.config.structural.active_rules,
        allowed
    );
}

#[tokio::test]
async fn test_select_seeds_prompt_and_rules() {
    let orch = orchestrator();
    select(&orch, "acls").await;

    let state = orch.snapshot();
    let framework = state.active_framework.as_ref().unwrap();
    assert_eq!(state.prompt, framework.first_sample_prompt().unwrap());
    assert_eq!(
        state.config.structural.active_rules,
        framework.structural_rule_ids()
    );
    assert_eq!(state.run.progress_step, STEP_FRAMEWORK_LOADED);
    assert_eq!(state.logs.len(), 1);
    assert_eq!(state.logs.entries()[0].module, Module::System);
}

#[tokio::test]
async fn test_unknown_framework_is_rejected() {
    let orch = orchestrator();
    select(&orch, "constitution").await;
    let before = orch.snapshot();

    let err = orch
        .dispatch(Action::SelectFramework("missing".to_string()))
        .await
        .unwrap_err();

    assert_eq!(err, OrchestratorError::UnknownFramework("missing".to_string()));
    assert!(err.is_validation());
    assert_eq!(orch.snapshot(), before);
}

#[tokio::test]
async fn test_spec_round_trip() {
    let orch = orchestrator();
    select(&orch, "constitution").await;

    orch.dispatch(Action::ApplyDeclarativeSpec(json!({
        "constraints": ["PRINCIPLE_1", "PRINCIPLE_2"]
    })))
    .await
    .unwrap();

    let state = orch.snapshot();
    assert_eq!(
        state.config.structural.active_rules,
        rule_set(&["PRINCIPLE_1", "PRINCIPLE_2"])
    );
    assert_eq!(state.run.progress_step, STEP_CONFIGURING);

    let last = state.logs.last().unwrap();
    assert_eq!(last.module, Module::Structural);
    assert_eq!(last.event, "Specification Loaded");

    orch.dispatch(Action::ExecuteNarrative("Summarize".to_string()))
        .await
        .unwrap();
    let enforced: Vec<_> = orch
        .snapshot()
        .logs
        .iter()
        .filter(|e| e.event == "Constraint Enforced")
        .filter_map(|e| e.metadata.as_ref()?.get("rule")?.as_str().map(str::to_string))
        .collect();
    assert_eq!(enforced, vec!["PRINCIPLE_1", "PRINCIPLE_2"]);
}

#[tokio::test]
async fn test_spec_with_unknown_ids_keeps_subset_invariant() {
    let orch = orchestrator();
    select(&orch, "constitution").await;

    orch.dispatch(Action::ApplyDeclarativeSpec(json!({
        "constraints": ["PRINCIPLE_3", "NOT_A_RULE", "CONST_TONE", 42]
    })))
    .await
    .unwrap();

    assert_subset_invariant(&orch);
    let state = orch.snapshot();
    assert_eq!(state.config.structural.active_rules, rule_set(&["PRINCIPLE_3"]));
    let metadata = state.logs.last().unwrap().metadata.clone().unwrap();
    assert_eq!(metadata["applied"], 1);
    assert_eq!(metadata["ignored"], 3);
}

#[tokio::test]
async fn test_structural_patch_keeps_subset_invariant() {
    let orch = orchestrator();
    select(&orch, "bitcoin").await;

    orch.dispatch(Action::UpdateConfig(ConfigPatch::Structural(StructuralPatch {
        active_rules: Some(rule_set(&["BTC_ACCURACY", "PRINCIPLE_1", "BTC_NEUTRAL"])),
    })))
    .await
    .unwrap();

    assert_subset_invariant(&orch);
    assert_eq!(
        orch.snapshot().config.structural.active_rules,
        rule_set(&["BTC_ACCURACY"])
    );
}

#[tokio::test]
async fn test_malformed_spec_is_a_logged_no_op() {
    let orch = orchestrator();
    select(&orch, "constitution").await;
    let before = orch.snapshot();

    let err = orch
        .dispatch(Action::ApplyDeclarativeSpec(json!({
            "constraints": "not-a-list"
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::MalformedSpec(_)));

    let after = orch.snapshot();
    assert_eq!(
        after.config.structural.active_rules,
        before.config.structural.active_rules
    );
    assert_eq!(after.logs.len(), before.logs.len() + 1);

    let errors: Vec<_> = after.logs.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].module, Module::System);
    assert!(errors[0].details.starts_with("Invalid spec format provided"));
}

#[tokio::test]
async fn test_spec_without_framework_is_rejected() {
    let orch = orchestrator();

    let err = orch
        .dispatch(Action::ApplyDeclarativeSpec(json!({ "constraints": [] })))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::MalformedSpec(_)));
    assert!(orch.snapshot().config.structural.active_rules.is_empty());
}

#[tokio::test]
async fn test_update_config_logs_under_layer_module() {
    let orch = orchestrator();
    select(&orch, "acls").await;

    orch.dispatch(Action::UpdateConfig(ConfigPatch::Symbolic(SymbolicPatch {
        coherence_strength: Some(QualitativeStrength::High),
        ..Default::default()
    })))
    .await
    .unwrap();

    let state = orch.snapshot();
    assert_eq!(state.config.symbolic.coherence_strength, QualitativeStrength::High);
    assert!(state.config.symbolic.archetype_projection);
    assert_eq!(state.run.progress_step, STEP_CONFIGURING);

    let last = state.logs.last().unwrap();
    assert_eq!(last.module, Module::from(GovernanceLayer::Symbolic));
    assert_eq!(last.event, "Configuration Change");
    assert!(last.details.contains("coherence_strength: High"));
}

#[tokio::test]
async fn test_set_prompt_and_domain() {
    let orch = orchestrator();
    select(&orch, "constitution").await;

    orch.dispatch(Action::SetPrompt("Custom prompt".to_string()))
        .await
        .unwrap();
    orch.dispatch(Action::SetActiveDomain(Domain::WildCore))
        .await
        .unwrap();

    let state = orch.snapshot();
    assert_eq!(state.prompt, "Custom prompt");
    assert_eq!(state.active_domain, Domain::WildCore);
    assert_eq!(state.run.progress_step, STEP_CONFIGURING);
    assert_eq!(state.logs.len(), 1);
}

#[tokio::test]
async fn test_action_deserializes_from_json() {
    let action: Action = serde_json::from_value(json!({
        "type": "update_config",
        "payload": { "layer": "Security", "simulation_enabled": false }
    }))
    .unwrap();

    let orch = orchestrator();
    select(&orch, "bitcoin").await;
    orch.dispatch(action).await.unwrap();

    assert!(!orch.snapshot().config.security.simulation_enabled);
}
