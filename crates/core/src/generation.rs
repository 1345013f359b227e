//! Text generation: the single opaque capability every generative stage uses.
//!
//! A generator takes a system prompt and a user prompt and returns text.
//! Nothing about the transport is assumed.
//!
//! Implementations: deterministic mock, OpenAI-compatible chat endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// A prompt pair for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
}

/// The generation capability.
///
/// The pipeline never inspects which backend answered; parse and transport
/// failures are handled identically by the stage executors.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// A human-readable name for this backend (e.g., "mock", "openai").
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError>;

    /// Health check: can the backend be reached?
    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let req = GenerationRequest::new("sys", "user");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["systemPrompt"], "sys");
        assert_eq!(json["userPrompt"], "user");
    }
}
