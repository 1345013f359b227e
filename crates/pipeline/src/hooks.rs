//! Integration hooks: push stage highlights into Project memory and the
//! concept graph.

use iqraa_core::error::StorageError;
use iqraa_core::journal::Actor;
use iqraa_core::memory::{ConceptGraph, ProjectMemory, Record};
use iqraa_core::persona::{MemoryMode, Persona};
use iqraa_memory::MemoryStore;
use serde_json::{json, Value};
use tracing::debug;

use crate::executor::{ExpansionResult, ReasoningResult};

pub const THEME_PREFIX: &str = "theme:";

/// Record the expansion in Project memory, then grow the concept graph
/// according to the persona's memory mode.
pub async fn on_expanded(
    store: &mut MemoryStore,
    persona: &Persona,
    expansion: &ExpansionResult,
) -> Result<(), StorageError> {
    let runs = store.project().runs_count().unwrap_or(0) + 1;

    let mut patch = Record::new();
    patch.insert(ProjectMemory::LAST_CONCEPTS.into(), json!(expansion.concepts));
    patch.insert(ProjectMemory::LAST_THEMES.into(), json!(expansion.themes));
    patch.insert(ProjectMemory::RUNS_COUNT.into(), json!(runs));
    store
        .save_project(patch, Actor::Pipeline, Some("expansion highlights".into()))
        .await?;

    match grow_graph(store.concept_graph(), persona.memory_mode, expansion) {
        Some(graph) => {
            store
                .save_concept_graph(
                    graph,
                    Actor::Pipeline,
                    Some(format!("{} concept capture", persona.memory_mode.as_str())),
                )
                .await?;
        }
        None => debug!(mode = persona.memory_mode.as_str(), "Concept graph left unchanged"),
    }
    Ok(())
}

/// Record the reasoning text (or its raw fallback) in Project memory.
pub async fn on_reasoned(store: &mut MemoryStore, reasoning: &ReasoningResult) -> Result<(), StorageError> {
    let mut patch = Record::new();
    patch.insert(
        ProjectMemory::LAST_REASONING.into(),
        reasoning.text().map_or(Value::Null, |t| Value::String(t.to_string())),
    );
    store
        .save_project(patch, Actor::Pipeline, Some("reasoning highlight".into()))
        .await?;
    Ok(())
}

/// The graph after capturing `expansion`, or `None` when nothing changes.
///
/// `Balanced` adds a node per concept and a `co-occurs` edge between
/// consecutive concepts. `Aggressive` also adds a node per theme with a
/// `frames` edge to every concept. `Conservative` never changes the graph.
pub fn grow_graph(
    current: &ConceptGraph,
    mode: MemoryMode,
    expansion: &ExpansionResult,
) -> Option<ConceptGraph> {
    if mode == MemoryMode::Conservative {
        return None;
    }

    let mut graph = current.clone();
    for concept in &expansion.concepts {
        upsert_node(&mut graph, concept, concept, "concept");
    }
    for pair in expansion.concepts.windows(2) {
        add_edge(&mut graph, &pair[0], &pair[1], "co-occurs");
    }

    if mode == MemoryMode::Aggressive {
        for theme in &expansion.themes {
            let id = format!("{THEME_PREFIX}{theme}");
            upsert_node(&mut graph, &id, theme, "theme");
            for concept in &expansion.concepts {
                add_edge(&mut graph, &id, concept, "frames");
            }
        }
    }

    (graph != *current).then_some(graph)
}

fn upsert_node(graph: &mut ConceptGraph, id: &str, label: &str, kind: &str) {
    let mentions = graph
        .nodes
        .get(id)
        .and_then(|n| n.get("mentions"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    graph.nodes.insert(
        id.to_string(),
        json!({ "label": label, "kind": kind, "mentions": mentions + 1 }),
    );
}

fn add_edge(graph: &mut ConceptGraph, source: &str, target: &str, relation: &str) {
    let edge = json!({ "source": source, "target": target, "relation": relation });
    if !graph.edges.contains(&edge) {
        graph.edges.push(edge);
    }
}
