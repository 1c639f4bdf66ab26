//! Audit Log Integration Tests
//!
//! Tests for the digest chain over a real run, JSONL export and tamper
//! detection on reload.

use std::sync::Arc;

use govflow::adapters::StaticGenerator;
use govflow::catalog::Catalog;
use govflow::core::{AuditChainError, AuditLog, Orchestrator, StagePacing};
use govflow::domain::Action;
use tempfile::TempDir;

async fn completed_run() -> Orchestrator {
    let orch = Orchestrator::builder(Catalog::builtin(), Arc::new(StaticGenerator::default()))
        .pacing(StagePacing::none())
        .build();
    orch.dispatch(Action::SelectFramework("constitution".to_string()))
        .await
        .unwrap();
    orch.dispatch(Action::ExecuteNarrative("Summarize Q3 sales".to_string()))
        .await
        .unwrap();
    orch
}

#[tokio::test]
async fn test_run_log_chain_verifies() {
    let orch = completed_run().await;
    let state = orch.snapshot();

    assert!(state.logs.len() > 5);
    state.logs.verify().unwrap();
    assert_eq!(state.logs.head_digest(), state.logs.last().unwrap().digest);
}

#[tokio::test]
async fn test_export_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit").join("run.jsonl");

    let orch = completed_run().await;
    let logs = orch.snapshot().logs;
    logs.export_jsonl(&path).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(content.lines().count(), logs.len());

    let reloaded = AuditLog::load_jsonl(&path).await.unwrap();
    let digests = |log: &AuditLog| log.iter().map(|e| e.digest.clone()).collect::<Vec<_>>();
    assert_eq!(digests(&reloaded), digests(&logs));
    reloaded.verify().unwrap();
}

#[tokio::test]
async fn test_tampered_export_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("run.jsonl");

    let orch = completed_run().await;
    orch.snapshot().logs.export_jsonl(&path).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let tampered = content.replacen("Scan Clear", "Scan Skipped", 1);
    assert_ne!(content, tampered);
    tokio::fs::write(&path, tampered).await.unwrap();

    let reloaded = AuditLog::load_jsonl(&path).await.unwrap();
    match reloaded.verify() {
        Err(AuditChainError::BrokenLink { event, .. }) => assert_eq!(event, "Scan Skipped"),
        Ok(()) => panic!("tampering went undetected"),
    }
}

#[tokio::test]
async fn test_text_moved_between_event_and_details_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("run.jsonl");

    let orch = completed_run().await;
    orch.snapshot().logs.export_jsonl(&path).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let tampered = content.replacen(
        r#""event":"Scan Clear","details":"No"#,
        r#""event":"Scan","details":" ClearNo"#,
        1,
    );
    assert_ne!(content, tampered);
    tokio::fs::write(&path, tampered).await.unwrap();

    let reloaded = AuditLog::load_jsonl(&path).await.unwrap();
    assert!(matches!(
        reloaded.verify(),
        Err(AuditChainError::BrokenLink { event, .. }) if event == "Scan"
    ));
}
