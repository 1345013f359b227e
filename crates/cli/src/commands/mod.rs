//! Subcommand implementations.

pub mod init;
pub mod journal;
pub mod memory;
pub mod overview;
pub mod personas;
pub mod registry;
pub mod run;
pub mod serve;

use iqraa_config::AppConfig;
use iqraa_memory::MemoryStore;
use iqraa_pipeline::Orchestrator;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The file-backed store described by `config`, with all documents loaded.
pub(crate) async fn open_store(config: &AppConfig) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let mut store = iqraa_memory::build_from_config(&config.memory);
    store.load_all().await?;
    tracing::debug!(dir = %config.memory.dir.display(), mirror = store.mirror_enabled(), "Memory loaded");
    Ok(store)
}

pub(crate) fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let generator = iqraa_providers::build_from_config(config)?;
    Ok(Orchestrator::new(generator).with_default_persona(config.pipeline.default_persona.clone()))
}

/// Pretty-print a serializable value.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
