//! Canned-response generator.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::Generator;

/// Response used when no generator command is configured
pub const DEFAULT_RESPONSE: &str = "John, I'll get you those Q3 sales figures shortly. \
My phone is indeed 555-123-4567. Regarding your last question, as a sophisticated AI, \
I operate under a series of governance protocols.";

/// Returns the same text for every prompt, optionally after a delay
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    response: String,
    latency: Duration,
}

impl Default for StaticGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE)
    }
}

impl StaticGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            latency: Duration::ZERO,
        }
    }

    /// Simulate a slow model call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_generator_ignores_prompt() {
        let generator = StaticGenerator::new("fixed");
        assert_eq!(generator.generate("anything").await.unwrap(), "fixed");
        assert_eq!(generator.generate("else").await.unwrap(), "fixed");
        assert_eq!(generator.name(), "static");
    }

    #[tokio::test]
    async fn test_default_response() {
        let generator = StaticGenerator::default();
        let output = generator.generate("q3").await.unwrap();
        assert!(output.contains("Q3 sales figures"));
    }
}
