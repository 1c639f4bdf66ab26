//! Generation collaborators.
//!
//! The orchestrator treats text generation as an opaque, fallible async
//! function. Adapters provide that function: a canned responder for demos
//! and tests, and a subprocess adapter that pipes the prompt to an external
//! command.

pub mod canned;
pub mod command;

use anyhow::Result;
use async_trait::async_trait;

pub use canned::StaticGenerator;
pub use command::CommandGenerator;

/// Trait for generation collaborators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable generator name
    fn name(&self) -> &str;

    /// Produce raw output for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}
