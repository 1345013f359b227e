//! `iqraa route` and `iqraa stages`: read-only views of the stage registry.

use iqraa_pipeline::{asymmetric_edges, list_stages, route_plan};

pub fn route(intent: &str) -> Result<(), Box<dyn std::error::Error>> {
    let plan = route_plan(intent);

    println!("🧭 Route for: \"{}\"", plan.intent);
    println!();
    for stage in &plan.stages {
        println!("  {:>2}. {:<24} {}", stage.id.0, stage.name, stage.purpose);
    }

    Ok(())
}

pub fn stages(check: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("📦 Stage Registry");
    println!("=================");
    for stage in list_stages() {
        println!("  {:>2}. {}", stage.id.0, stage.name);
        println!("      {}", stage.purpose);
        if !stage.depends_on.is_empty() {
            println!("      depends on: {}", join_ids(stage.depends_on));
        }
        if !stage.feeds_into.is_empty() {
            println!("      feeds into: {}", join_ids(stage.feeds_into));
        }
    }

    if check {
        println!();
        let edges = asymmetric_edges();
        if edges.is_empty() {
            println!("✅ Every edge is declared on both sides");
        } else {
            println!("⚠️  {} one-sided edge(s):", edges.len());
            for edge in edges {
                println!("  {} -> {} (only in {})", edge.from, edge.to, edge.declared_as);
            }
        }
    }

    Ok(())
}

fn join_ids(ids: &[iqraa_core::stage::StageId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
