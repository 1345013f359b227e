//! `iqraa serve`: start the HTTP API server.

use super::load_config;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📖 Iqraa Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Generator: {}", config.generator.provider);
    println!("   Memory:    {}", config.memory.dir.display());

    iqraa_gateway::start(config).await?;

    Ok(())
}
