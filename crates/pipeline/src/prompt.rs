//! Prompt assembly.
//!
//! Builds the `(system, user)` prompt pair for each generative stage from
//! the run context and the upstream results threaded forward so far.
//! Assembly is pure: no I/O, no failure. Long text is hard-truncated on
//! character boundaries with [`TRUNCATION_MARKER`] appended.

use std::borrow::Cow;

use iqraa_core::generation::GenerationRequest;
use iqraa_core::memory::{ConceptGraph, ProjectMemory, SessionMemory};
use iqraa_core::persona::Persona;
use iqraa_core::stage::StageKind;
use iqraa_memory::MemoryStore;

pub const TRUNCATION_MARKER: &str = "\n\n[... truncated for prompt ...]";

// ── Per-stage character limits ─────────────────────────────────────────────

pub const EXPANSION_INPUT_LIMIT: usize = 3500;
pub const ANALYTICS_INPUT_LIMIT: usize = 2500;
pub const ANALYTICS_SUMMARY_LIMIT: usize = 1000;
pub const PLANNER_INPUT_LIMIT: usize = 2500;
pub const PLANNER_SUMMARY_LIMIT: usize = 1200;
pub const REASONING_INPUT_LIMIT: usize = 2500;
pub const REASONING_SUMMARY_LIMIT: usize = 800;
pub const REASONING_NOTES_LIMIT: usize = 1000;
pub const INSIGHT_SUMMARY_LIMIT: usize = 800;
pub const INSIGHT_NOTES_LIMIT: usize = 1000;
pub const INSIGHT_REASONING_LIMIT: usize = 1200;

// ── Context ────────────────────────────────────────────────────────────────

/// Everything a stage prompt may draw on for one run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub input: &'a str,
    pub persona: &'static Persona,
    pub session: &'a SessionMemory,
    pub project: &'a ProjectMemory,
    pub concept_graph: &'a ConceptGraph,
}

impl<'a> PipelineContext<'a> {
    /// Borrow the current documents of `store`.
    pub fn from_store(input: &'a str, persona: &'static Persona, store: &'a MemoryStore) -> Self {
        Self {
            input,
            persona,
            session: store.session(),
            project: store.project(),
            concept_graph: store.concept_graph(),
        }
    }
}

/// Text produced by earlier stages of the same run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Upstream<'a> {
    pub expansion_summary: Option<&'a str>,
    pub analytics_notes: Option<&'a str>,
    pub reasoning_text: Option<&'a str>,
}

// ── Truncation ─────────────────────────────────────────────────────────────

/// Keep at most `max_chars` characters, appending the marker when cut.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
    }
}

// ── Builders ───────────────────────────────────────────────────────────────

/// Assemble the prompt pair for `kind`.
pub fn build(kind: StageKind, ctx: &PipelineContext<'_>, upstream: &Upstream<'_>) -> GenerationRequest {
    match kind {
        StageKind::Expansion => expansion(ctx),
        StageKind::Analytics => analytics(ctx, upstream),
        StageKind::Planning => planning(ctx, upstream),
        StageKind::Reasoning => reasoning(ctx, upstream),
        StageKind::Synthesis => synthesis(ctx, upstream),
    }
}

// Result shapes. Bare type names keep the shapes themselves from parsing
// as JSON.

const EXPANSION_SHAPE: &str = r#"{
  "concepts": [string],
  "themes": [string],
  "summary": string
}"#;

const ANALYTICS_SHAPE: &str = r#"{
  "density": number,
  "coherence": number,
  "complexity": number,
  "flags": [string],
  "notes": string
}"#;

const PLAN_SHAPE: &str = r#"{
  "summary": string,
  "steps": [
    {
      "id": string,
      "title": string,
      "description": string,
      "phase": string,
      "priority": "low" | "medium" | "high"
    }
  ]
}"#;

const REASONING_SHAPE: &str = r#"{
  "reasoningText": string,
  "assumptions": [string],
  "implications": [string]
}"#;

const INSIGHT_SHAPE: &str = r#"{
  "title": string,
  "summary": string,
  "recommendations": [string],
  "tags": [string]
}"#;

fn persona_header(role: &str, persona: &Persona) -> String {
    let focus = persona.focus.topics();
    let focus = if focus.is_empty() {
        "general".to_string()
    } else {
        focus.join(", ")
    };
    format!(
        "You are the {role} of the Iqraa analysis pipeline.\n\
         Active persona: {} ({}).\n\
         Tone: {}.\n\
         Focus: {focus}.",
        persona.name,
        persona.title,
        persona.tone.as_str(),
    )
}

fn json_instruction(shape: &str) -> String {
    format!("Respond with a single JSON object of exactly this shape and nothing else:\n{shape}")
}

fn section(label: &str, text: Option<&str>, limit: usize) -> String {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("{label}:\n{}\n\n", truncate_for_prompt(t, limit)),
        None => format!("{label}: (not available)\n\n"),
    }
}

fn expansion(ctx: &PipelineContext<'_>) -> GenerationRequest {
    let p = ctx.persona;
    let system = format!(
        "{}\nSemantic expansion depth: {}.\n\
         Expand the meaning of the text into its key concepts and overarching themes.",
        persona_header("Interpretation & Expansion Layer", p),
        p.semantic_expansion_depth.as_str(),
    );

    let mut user = String::new();
    if let Some(topic) = ctx.project.current_topic() {
        user.push_str(&format!("Current project topic: {topic}\n\n"));
    }
    if ctx.concept_graph.node_count() > 0 {
        user.push_str(&format!(
            "Known concepts in memory: {}\n\n",
            ctx.concept_graph.node_count()
        ));
    }
    user.push_str(&section("Input text", Some(ctx.input), EXPANSION_INPUT_LIMIT));
    user.push_str(&json_instruction(EXPANSION_SHAPE));

    GenerationRequest::new(system, user)
}

fn analytics(ctx: &PipelineContext<'_>, up: &Upstream<'_>) -> GenerationRequest {
    let p = ctx.persona;
    let w = p.cognitive_weights;
    let system = format!(
        "{}\nScore the text for semantic density, coherence and complexity, \
         each between 0 and 1. Persona weights: density {:.2}, coherence {:.2}, \
         complexity {:.2}. List any quality flags and add short notes.",
        persona_header("Cognitive Analytics & Telemetry engine", p),
        w.density,
        w.coherence,
        w.complexity,
    );

    let mut user = section("Input text", Some(ctx.input), ANALYTICS_INPUT_LIMIT);
    user.push_str(&section(
        "Expansion summary",
        up.expansion_summary,
        ANALYTICS_SUMMARY_LIMIT,
    ));
    user.push_str(&json_instruction(ANALYTICS_SHAPE));

    GenerationRequest::new(system, user)
}

fn planning(ctx: &PipelineContext<'_>, up: &Upstream<'_>) -> GenerationRequest {
    let system = format!(
        "{}\nBreak the work described by the text into ordered, actionable steps \
         grouped by phase, each with a priority of low, medium or high.",
        persona_header("Task Planning & Decomposition engine", ctx.persona),
    );

    let mut user = section("Input text", Some(ctx.input), PLANNER_INPUT_LIMIT);
    user.push_str(&section(
        "Expansion summary",
        up.expansion_summary,
        PLANNER_SUMMARY_LIMIT,
    ));
    user.push_str(&json_instruction(PLAN_SHAPE));

    GenerationRequest::new(system, user)
}

fn reasoning(ctx: &PipelineContext<'_>, up: &Upstream<'_>) -> GenerationRequest {
    let system = format!(
        "{}\nReason about the text step by step in a {} register. State the \
         assumptions you rely on and the implications that follow.",
        persona_header("Reasoning Engine", ctx.persona),
        ctx.persona.tone.as_str(),
    );

    let mut user = section("Input text", Some(ctx.input), REASONING_INPUT_LIMIT);
    user.push_str(&section(
        "Expansion summary",
        up.expansion_summary,
        REASONING_SUMMARY_LIMIT,
    ));
    user.push_str(&section(
        "Analytics notes",
        up.analytics_notes,
        REASONING_NOTES_LIMIT,
    ));
    user.push_str(&json_instruction(REASONING_SHAPE));

    GenerationRequest::new(system, user)
}

fn synthesis(ctx: &PipelineContext<'_>, up: &Upstream<'_>) -> GenerationRequest {
    let system = format!(
        "{}\nCombine the upstream signals into one coherent insight. \
         Preferred length: {}. Give 3 to 7 tags.",
        persona_header("Insight Synthesis Engine", ctx.persona),
        ctx.persona.preferred_length.as_str(),
    );

    let mut user = section(
        "Expansion summary",
        up.expansion_summary,
        INSIGHT_SUMMARY_LIMIT,
    );
    user.push_str(&section(
        "Analytics notes",
        up.analytics_notes,
        INSIGHT_NOTES_LIMIT,
    ));
    user.push_str(&section(
        "Reasoning",
        up.reasoning_text,
        INSIGHT_REASONING_LIMIT,
    ));
    user.push_str(&json_instruction(INSIGHT_SHAPE));

    GenerationRequest::new(system, user)
}
