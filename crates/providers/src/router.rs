//! Generator selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use iqraa_config::AppConfig;
use iqraa_core::error::GenerationError;
use iqraa_core::generation::TextGenerator;
use tracing::info;

use crate::mock::MockGenerator;
use crate::openai_compat::OpenAiCompatGenerator;

/// Build the configured generator.
///
/// `mock` needs nothing. Hosted providers need an API key; local ones
/// (`ollama`, `vllm`, `llamacpp`) do not. Unknown names are accepted when
/// `api_url` is set and treated as OpenAI-compatible endpoints.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let generator = &config.generator;
    let name = generator.provider.as_str();

    if name == "mock" {
        info!("Using mock generator");
        return Ok(Arc::new(MockGenerator::new()));
    }

    let base_url = match (&generator.api_url, default_base_url(name)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(GenerationError::NotConfigured(format!(
                "unknown provider '{name}' and no generator.api_url set"
            )));
        }
    };

    let api_key = match (&generator.api_key, is_local(name)) {
        (Some(key), _) => key.clone(),
        (None, true) => name.to_string(),
        (None, false) => {
            return Err(GenerationError::NotConfigured(format!(
                "provider '{name}' needs an API key (generator.api_key, IQRAA_API_KEY or OPENAI_API_KEY)"
            )));
        }
    };

    info!(provider = name, model = %generator.model, "Using OpenAI-compatible generator");
    let g = OpenAiCompatGenerator::with_timeout(
        name,
        base_url,
        api_key,
        &generator.model,
        Duration::from_secs(generator.timeout_secs),
    )?
    .with_sampling(generator.temperature, generator.max_tokens);
    Ok(Arc::new(g))
}

fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
