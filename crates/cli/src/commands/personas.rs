//! `iqraa personas`: list, show and select personas.

use iqraa_core::persona::Persona;
use iqraa_pipeline::list_personas;

use super::{build_orchestrator, load_config, open_store};

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let store = open_store(&config).await?;
    let current = orchestrator.current_persona(&store);

    println!("🎭 Personas");
    println!("===========");
    for persona in list_personas() {
        let marker = if persona.id == current.id { "*" } else { " " };
        println!("{marker} {:<22} {}", persona.id, persona.title);
    }

    Ok(())
}

pub async fn current() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let store = open_store(&config).await?;

    print_persona(orchestrator.current_persona(&store));
    Ok(())
}

pub async fn select(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let mut store = open_store(&config).await?;

    let persona = orchestrator.select_persona(&mut store, id).await?;
    println!("✅ Selected persona: {} ({})", persona.name, persona.id);
    Ok(())
}

fn print_persona(persona: &Persona) {
    let w = &persona.cognitive_weights;
    println!("🎭 {} ({})", persona.name, persona.id);
    println!("   {}", persona.title);
    println!("   {}", persona.description);
    println!("   Tone:        {}", persona.tone.as_str());
    println!("   Focus:       {}", persona.focus.topics().join(", "));
    println!("   Expansion:   {}", persona.semantic_expansion_depth.as_str());
    println!("   Memory mode: {}", persona.memory_mode.as_str());
    println!("   Length:      {}", persona.preferred_length.as_str());
    println!(
        "   Weights:     density={:.2}, coherence={:.2}, complexity={:.2}",
        w.density, w.coherence, w.complexity
    );
}
