//! Append-only audit log with a SHA-256 digest chain.
//!
//! Insertion order is chronological order. Entries are never edited or
//! removed; the log is only cleared wholesale when a new run starts or the
//! framework is (re)selected. The log can be exported as newline-delimited
//! JSON (JSONL) for inspection.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::LogEntry;

/// Digest the first entry chains to
pub const GENESIS_DIGEST: &str = "";

/// Ordered sequence of sealed log entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<LogEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal and append an entry.
    ///
    /// The offset is measured from `run_started`; outside a run it is 0.
    pub fn append(&mut self, mut entry: LogEntry, run_started: Option<Instant>) -> &LogEntry {
        entry.time_offset = run_started
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        entry.digest = chain_digest(self.head_digest(), &entry);

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Digest of the most recent entry
    pub fn head_digest(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.digest.as_str())
            .unwrap_or(GENESIS_DIGEST)
    }

    /// Recompute the digest chain and report the first broken link
    pub fn verify(&self) -> Result<(), AuditChainError> {
        let mut previous = GENESIS_DIGEST;

        for (index, entry) in self.entries.iter().enumerate() {
            let expected = chain_digest(previous, entry);
            if expected != entry.digest {
                return Err(AuditChainError::BrokenLink {
                    index,
                    event: entry.event.clone(),
                });
            }
            previous = &entry.digest;
        }

        Ok(())
    }

    /// Write the log as JSONL, replacing any existing file
    pub async fn export_jsonl(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let mut file = File::create(path)
            .await
            .with_context(|| format!("Failed to create audit file: {}", path.display()))?;

        for entry in &self.entries {
            let json = serde_json::to_string(entry).context("Failed to serialize log entry")?;
            file.write_all(format!("{}\n", json).as_bytes())
                .await
                .context("Failed to write log entry")?;
        }
        file.flush().await.context("Failed to flush audit file")?;

        Ok(())
    }

    /// Read a JSONL export back in order
    pub async fn load_jsonl(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open audit file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut entries = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse log entry: {}", line))?;
            entries.push(entry);
        }

        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a AuditLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Tamper detected while verifying the chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditChainError {
    #[error("Audit chain broken at entry {index} ('{event}')")]
    BrokenLink { index: usize, event: String },
}

/// Digest of an entry chained to its predecessor (hex SHA-256)
pub fn chain_digest(previous: &str, entry: &LogEntry) -> String {
    let mut hasher = Sha256::new();
    hash_field(&mut hasher, previous.as_bytes());
    hash_field(&mut hasher, entry.id.as_bytes());
    hash_field(&mut hasher, entry.timestamp.to_rfc3339().as_bytes());
    hash_field(&mut hasher, format!("{:.6}", entry.time_offset).as_bytes());
    hash_field(&mut hasher, entry.module.to_string().as_bytes());
    hash_field(&mut hasher, entry.event.as_bytes());
    hash_field(&mut hasher, entry.details.as_bytes());
    match entry.metadata {
        Some(ref metadata) => {
            hasher.update([1u8]);
            hash_field(&mut hasher, metadata.to_string().as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hex::encode(hasher.finalize())
}

/// Length-prefixed so bytes cannot move across field boundaries
fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Module;
    use tempfile::TempDir;

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new();
        let start = Instant::now();
        log.append(LogEntry::new(Module::User, "Execution Start", "Prompt: \"hi\""), Some(start));
        log.append(LogEntry::new(Module::Llm, "Generation", "Requesting raw output..."), Some(start));
        log.append(
            LogEntry::new(Module::Security, "Scan Clear", "No injection patterns found")
                .with_metadata(serde_json::json!({ "patterns": 5 })),
            Some(start),
        );
        log
    }

    #[test]
    fn test_append_preserves_order() {
        let log = sample_log();
        let events: Vec<&str> = log.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, vec!["Execution Start", "Generation", "Scan Clear"]);
    }

    #[test]
    fn test_offsets_are_non_decreasing() {
        let log = sample_log();
        for pair in log.entries().windows(2) {
            assert!(pair[1].time_offset >= pair[0].time_offset);
        }
    }

    #[test]
    fn test_offset_zero_outside_run() {
        let mut log = AuditLog::new();
        let entry = log.append(LogEntry::new(Module::System, "Framework Loaded", "x"), None);
        assert_eq!(entry.time_offset, 0.0);
    }

    #[test]
    fn test_chain_verifies() {
        let log = sample_log();
        assert!(log.verify().is_ok());
        assert_eq!(log.entries()[0].digest.len(), 64);
        assert_ne!(log.entries()[0].digest, log.entries()[1].digest);
    }

    #[test]
    fn test_tampering_detected() {
        let mut log = sample_log();
        log.entries[1].details = "Something else happened".to_string();

        let err = log.verify().unwrap_err();
        assert_eq!(
            err,
            AuditChainError::BrokenLink {
                index: 1,
                event: "Generation".to_string()
            }
        );
    }

    #[test]
    fn test_shifting_text_between_fields_is_detected() {
        let mut log = AuditLog::new();
        log.append(LogEntry::new(Module::System, "Error", "Invalid spec"), None);

        log.entries[0].event = "Err".to_string();
        log.entries[0].details = "orInvalid spec".to_string();

        assert_eq!(
            log.verify().unwrap_err(),
            AuditChainError::BrokenLink {
                index: 0,
                event: "Err".to_string()
            }
        );
    }

    #[test]
    fn test_metadata_cannot_be_folded_into_details() {
        let mut log = AuditLog::new();
        log.append(
            LogEntry::new(Module::Security, "Scan Clear", "ok")
                .with_metadata(serde_json::json!({ "patterns": 5 })),
            None,
        );

        let metadata = log.entries[0].metadata.take().unwrap();
        log.entries[0].details = format!("ok{}", metadata);

        assert!(log.verify().is_err());
    }

    #[test]
    fn test_clear_resets_head() {
        let mut log = sample_log();
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.head_digest(), GENESIS_DIGEST);
    }

    #[tokio::test]
    async fn test_jsonl_export_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("audit").join("run.jsonl");
        let log = sample_log();

        log.export_jsonl(&path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        let loaded = AuditLog::load_jsonl(&path).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.entries()[2].event, "Scan Clear");
        assert!(loaded.verify().is_ok());
    }
}
