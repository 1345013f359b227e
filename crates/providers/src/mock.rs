//! Deterministic development generator.
//!
//! Echoes the prompts back instead of calling a model, so the whole pipeline
//! runs offline. Stage executors see unparsable text and degrade, which is
//! exactly what a run without a configured backend should look like.

use async_trait::async_trait;
use iqraa_core::error::GenerationError;
use iqraa_core::generation::{GenerationRequest, GenerationResponse, TextGenerator};

/// User prompt characters echoed back.
const ECHO_LIMIT: usize = 800;

#[derive(Debug, Default, Clone)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let system = if request.system_prompt.trim().is_empty() {
            "(none)".to_string()
        } else {
            request.system_prompt
        };
        let user: String = request.user_prompt.chars().take(ECHO_LIMIT).collect();

        let text = [
            "[mock generator response]",
            "",
            "System prompt:",
            system.as_str(),
            "",
            "User prompt:",
            user.as_str(),
        ]
        .join("\n");

        Ok(GenerationResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_both_prompts() {
        let response = MockGenerator::new()
            .generate(GenerationRequest::new("be brief", "hello"))
            .await
            .unwrap();
        assert!(response.text.starts_with("[mock generator response]"));
        assert!(response.text.contains("be brief"));
        assert!(response.text.contains("hello"));
    }

    #[tokio::test]
    async fn truncates_long_user_prompt() {
        let long = "x".repeat(2000);
        let response = MockGenerator::new()
            .generate(GenerationRequest::new("", long))
            .await
            .unwrap();
        assert!(response.text.contains("(none)"));
        assert_eq!(response.text.matches('x').count(), ECHO_LIMIT);
    }

    #[tokio::test]
    async fn is_deterministic() {
        let g = MockGenerator::new();
        let a = g.generate(GenerationRequest::new("s", "u")).await.unwrap();
        let b = g.generate(GenerationRequest::new("s", "u")).await.unwrap();
        assert_eq!(a, b);
    }
}
