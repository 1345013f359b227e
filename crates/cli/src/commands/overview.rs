//! `iqraa overview`: the dashboard summary, in the terminal.

use super::{build_orchestrator, load_config, open_store};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let store = open_store(&config).await?;
    let overview = orchestrator.overview(&store);

    println!("📖 Iqraa Overview");
    println!("=================");
    println!(
        "  Persona:  {} ({}, {} memory)",
        overview.persona.name,
        overview.persona.id,
        overview.persona.memory_mode.as_str()
    );
    println!("  Runs:     {}", overview.runs_count);
    println!(
        "  Last run: {}",
        overview.last_run_at.as_deref().unwrap_or("(never)")
    );

    if let Some(input) = &overview.last_input_snippet {
        println!();
        println!("  Last input:");
        println!("    {input}");
    }
    if let Some(insight) = &overview.last_insight_snippet {
        println!();
        println!("  Last insight:");
        println!("    {insight}");
    }

    Ok(())
}
