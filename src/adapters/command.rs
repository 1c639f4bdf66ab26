//! Subprocess generator.
//!
//! Spawns a configured command, writes the prompt to its stdin and takes
//! stdout as the generated text. Any model CLI that reads a prompt from
//! stdin can be plugged in this way.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::Generator;

/// Generator backed by an external command
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Program to run
    program: String,

    /// Arguments passed before stdin is written
    args: Vec<String>,

    /// Upper bound on a single call
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn generator '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits without reading stdin is judged by its exit status
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e).context("Failed to write prompt to generator stdin");
                }
            }
            // Dropping stdin signals EOF
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Generator '{}' timed out after {:?}",
                    self.program, self.timeout
                )
            })?
            .with_context(|| format!("Failed to wait for generator '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Generator '{}' failed with exit code {}: {}",
                self.program,
                exit_code,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("Generator output is not valid UTF-8")?;
        debug!(program = %self.program, bytes = stdout.len(), "Generator returned output");

        Ok(stdout.trim_end().to_string())
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    fn name(&self) -> &str {
        "command"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.run(prompt).await
    }
}
