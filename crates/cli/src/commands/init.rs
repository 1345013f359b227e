//! `iqraa init`: first-time setup.

use iqraa_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📖 Iqraa: First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config file exists, leaving it alone: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote default config: {}", config_path.display());
    }

    // Read back whatever is on disk so an existing file decides the memory dir.
    let config = AppConfig::load_from(&config_path)?;
    let memory_dir = &config.memory.dir;
    if !memory_dir.exists() {
        std::fs::create_dir_all(memory_dir)?;
        println!("✅ Created memory directory: {}", memory_dir.display());
    } else {
        println!("  Memory directory exists: {}", memory_dir.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Set generator.provider and an API key in {}", config_path.display());
    println!("     (or export IQRAA_API_KEY); the default \"mock\" generator needs neither");
    println!("  2. iqraa run \"your text here\"");
    println!("  3. iqraa serve");

    Ok(())
}
