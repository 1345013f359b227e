//! `iqraa run` and `iqraa plan`: drive the pipeline from the terminal.

use iqraa_pipeline::{PipelineResult, PlanOutcome, RunOptions};

use super::{build_orchestrator, load_config, open_store, print_json};

fn options(persona: Option<String>) -> RunOptions {
    persona.map(RunOptions::with_persona).unwrap_or_default()
}

pub async fn run(
    text: &str,
    persona: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let mut store = open_store(&config).await?;

    let result = orchestrator.run(&mut store, text, options(persona)).await?;

    if json {
        return print_json(&result);
    }
    print_run(&result, orchestrator.generator_name());
    Ok(())
}

fn print_run(result: &PipelineResult, generator: &str) {
    println!("📖 Iqraa Pipeline Run");
    println!("=====================");
    println!("  Run:       {}", result.run_id);
    println!("  Persona:   {} ({})", result.persona.name, result.persona.id);
    println!("  Generator: {generator}");
    println!(
        "  Input:     {} words, {} sentences, language {}",
        result.primary.word_count, result.primary.sentence_count, result.primary.language
    );

    println!();
    println!("🔎 Expansion");
    if !result.expansion.concepts.is_empty() {
        println!("  Concepts: {}", result.expansion.concepts.join(", "));
    }
    if !result.expansion.themes.is_empty() {
        println!("  Themes:   {}", result.expansion.themes.join(", "));
    }
    if let Some(summary) = result.expansion.summary_text() {
        println!("  {summary}");
    }

    println!();
    println!("📊 Analytics");
    match result.analytics.weighted_score {
        Some(score) => println!("  Weighted score: {score:.2}"),
        None => println!("  Weighted score: (not available)"),
    }
    for flag in &result.analytics.flags {
        println!("  ⚠ {flag}");
    }

    println!();
    println!("🧠 Reasoning");
    if let Some(text) = result.reasoning.text() {
        println!("  {text}");
    }

    println!();
    println!("💡 Insight");
    if let Some(title) = &result.insight.title {
        println!("  {title}");
    }
    if let Some(summary) = result.insight.summary_text() {
        println!("  {summary}");
    }
    for rec in &result.insight.recommendations {
        println!("  - {rec}");
    }

    let degraded = result.degraded_stages();
    if degraded > 0 {
        println!();
        println!("  {degraded} stage(s) returned raw output; see `iqraa run --json` for details.");
    }

    println!();
    for doc in &result.sync.documents {
        let status = if doc.mirror.is_mirrored() { "✅" } else { "➖" };
        println!("  {status} {} synced", doc.document);
    }
}

pub async fn plan(text: &str, persona: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;
    let mut store = open_store(&config).await?;

    let outcome = orchestrator.plan(&mut store, text, options(persona)).await?;
    print_plan(&outcome);
    Ok(())
}

fn print_plan(outcome: &PlanOutcome) {
    println!("🗺️  Task Plan ({})", outcome.persona.name);
    println!("==========");
    if let Some(summary) = &outcome.plan.summary {
        println!("  {summary}");
    }
    if let Some(raw) = &outcome.plan.fallback {
        println!("  (raw) {raw}");
    }
    for step in &outcome.plan.steps {
        let id = step.id.as_deref().unwrap_or("-");
        let phase = step.phase.as_deref().map(|p| format!(" [{p}]")).unwrap_or_default();
        println!("  {id:>7}. {}{phase}", step.title);
        if let Some(description) = &step.description {
            println!("           {description}");
        }
    }
}
