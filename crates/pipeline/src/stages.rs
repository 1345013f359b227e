//! The stage registry: twelve processing "boxes" and their declared edges.
//!
//! The registry is documentary. The orchestrator does not schedule from
//! these edges; it runs [`RUN_PLAN`] in order.

use iqraa_core::stage::{Stage, StageId, StageKind};
use serde::Serialize;

/// Generative stages executed by a run, in order. Primary intake (stage 1)
/// precedes them and is not generative.
pub const RUN_PLAN: [StageKind; 4] = [
    StageKind::Expansion,
    StageKind::Analytics,
    StageKind::Reasoning,
    StageKind::Synthesis,
];

pub const PRIMARY_STAGE: StageId = StageId(1);

pub static STAGES: [Stage; 12] = [
    Stage {
        id: StageId(1),
        name: "Primary Processing Engine",
        purpose: "Normalize and structure raw input into a machine-ready form.",
        description: "The entry point of the pipeline. Handles intake, normalization, intent detection, text cleaning, metadata extraction, and preparation for semantic expansion.",
        inputs: &["raw_text", "user_instruction", "document_blob"],
        outputs: &["clean_text", "intent", "task_type", "primary_context"],
        triggers: &["on_user_submit", "on_document_upload"],
        depends_on: &[StageId(6)],
        feeds_into: &[StageId(2)],
    },
    Stage {
        id: StageId(2),
        name: "Interpretation & Expansion Layer",
        purpose: "Expand meaning, build semantic trees, create conceptual frames.",
        description: "Transforms normalized input into structured understanding. Generates semantic expansions, builds a concept map, and prepares content for analytics.",
        inputs: &["primary_context", "session_memory"],
        outputs: &["semantic_tree", "expanded_context", "concept_map"],
        triggers: &["after_box_1"],
        depends_on: &[StageId(1), StageId(6)],
        feeds_into: &[StageId(3)],
    },
    Stage {
        id: StageId(3),
        name: "Cognitive Analytics & Telemetry",
        purpose: "Evaluate quality, generate KPIs, score coherence, detect anomalies.",
        description: "Produces system-level metrics: semantic density, reasoning depth, coherence scoring, topic KPIs, and cognitive telemetry.",
        inputs: &["semantic_tree", "concept_map"],
        outputs: &["kpi_report", "flags", "telemetry"],
        triggers: &["after_box_2"],
        depends_on: &[StageId(2)],
        feeds_into: &[StageId(12), StageId(10)],
    },
    Stage {
        id: StageId(4),
        name: "Advanced Search & Retrieval",
        purpose: "Retrieve context, memories, documents relevant to the task.",
        description: "Semantic retrieval engine linked with memory, documents, and multi-source embeddings.",
        inputs: &["query", "search_context"],
        outputs: &["retrieved_items", "ranked_results"],
        triggers: &["on_search", "pipeline_needs_context"],
        depends_on: &[StageId(6)],
        feeds_into: &[StageId(2), StageId(3), StageId(11)],
    },
    Stage {
        id: StageId(5),
        name: "Multi-Agent Workspace Engine",
        purpose: "Coordinate and manage multiple cooperating agents.",
        description: "Handles agent roles, task passing, conversation routing, and cooperative reasoning.",
        inputs: &["task_graph", "agent_instruction"],
        outputs: &["agent_updates", "collaborative_results"],
        triggers: &["complex_task_detected"],
        depends_on: &[StageId(1), StageId(7), StageId(11)],
        feeds_into: &[StageId(2), StageId(10)],
    },
    Stage {
        id: StageId(6),
        name: "Context Memory Store",
        purpose: "Store and retrieve short-term and long-term memory.",
        description: "Maintains contextual traces, project memory, and retrieval hooks.",
        inputs: &["memory_write_request"],
        outputs: &["memory_block", "retrieved_memory"],
        triggers: &["on_input", "on_query", "pipeline_requires_memory"],
        depends_on: &[],
        feeds_into: &[StageId(1), StageId(2), StageId(4)],
    },
    Stage {
        id: StageId(7),
        name: "Task Planning & Decomposition",
        purpose: "Break down complex tasks and generate a task graph.",
        description: "Planner engine producing structured workflows, sub-tasks, and sequencing graphs.",
        inputs: &["task_type", "intent"],
        outputs: &["task_graph", "task_breakdown"],
        triggers: &["complex_task_identified"],
        depends_on: &[StageId(1), StageId(11)],
        feeds_into: &[StageId(5), StageId(12)],
    },
    Stage {
        id: StageId(8),
        name: "Execution & Tools Runtime",
        purpose: "Execute code, run tools, and operate system actions.",
        description: "Handles tool calls, code execution, environment operations, and structured outputs.",
        inputs: &["execution_request"],
        outputs: &["execution_output"],
        triggers: &["runtime_needed"],
        depends_on: &[StageId(12)],
        feeds_into: &[StageId(10)],
    },
    Stage {
        id: StageId(9),
        name: "Document Intelligence Layer",
        purpose: "Extract and structure insights from documents.",
        description: "Document parser with multi-level extraction, structuring, segmentation, and insight mining.",
        inputs: &["document_blob"],
        outputs: &["structured_doc", "doc_insights"],
        triggers: &["document_uploaded"],
        depends_on: &[StageId(1), StageId(6)],
        feeds_into: &[StageId(10), StageId(2)],
    },
    Stage {
        id: StageId(10),
        name: "Insight Synthesis Engine",
        purpose: "Combine signals into coherent insights.",
        description: "Synthesizes knowledge blocks, KPIs, expansions, and reasoning into high-level insights.",
        inputs: &["semantic_tree", "kpi_report", "doc_insights"],
        outputs: &["synthesized_insights", "final_summary"],
        triggers: &["after_analysis_complete"],
        depends_on: &[StageId(2), StageId(3), StageId(9)],
        feeds_into: &[StageId(12)],
    },
    Stage {
        id: StageId(11),
        name: "Reasoning Engine",
        purpose: "Perform logical reasoning, modeling, and chain-of-thought orchestration.",
        description: "Handles logical reasoning, symbolic modeling, scenario simulation, contradiction checks, and deeper analytical inference.",
        inputs: &["primary_context", "retrieved_items"],
        outputs: &["reasoned_block", "logic_map"],
        triggers: &["reasoning_required"],
        depends_on: &[StageId(1), StageId(4)],
        feeds_into: &[StageId(2), StageId(7), StageId(10)],
    },
    Stage {
        id: StageId(12),
        name: "Command Center Orchestration",
        purpose: "Central routing and pipeline orchestration.",
        description: "Controls flow between boxes, handles errors, manages priorities, and supervises the lifecycle of each pipeline run.",
        inputs: &["pipeline_request"],
        outputs: &["orchestration_decision"],
        triggers: &["on_pipeline_start"],
        depends_on: &[StageId(3), StageId(7), StageId(10)],
        feeds_into: &[StageId(8)],
    },
];

/// Look up a stage. Unknown ids are `None`, never a panic.
pub fn get_stage(id: StageId) -> Option<&'static Stage> {
    STAGES.iter().find(|s| s.id == id)
}

/// All stages in registry order.
pub fn list_stages() -> &'static [Stage] {
    &STAGES
}

/// A declared edge whose mirror edge is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricEdge {
    pub from: StageId,
    pub to: StageId,
    /// `feeds_into` when `from` feeds `to` without `to` depending on it,
    /// `depends_on` when `from` depends on `to` without `to` feeding it.
    pub declared_as: &'static str,
}

/// Every one-sided edge in the registry, in registry order.
pub fn asymmetric_edges() -> Vec<AsymmetricEdge> {
    let mut edges = Vec::new();
    for stage in &STAGES {
        for &target in stage.feeds_into {
            let mirrored = get_stage(target).is_some_and(|t| t.depends_on.contains(&stage.id));
            if !mirrored {
                edges.push(AsymmetricEdge {
                    from: stage.id,
                    to: target,
                    declared_as: "feeds_into",
                });
            }
        }
        for &source in stage.depends_on {
            let mirrored = get_stage(source).is_some_and(|s| s.feeds_into.contains(&stage.id));
            if !mirrored {
                edges.push(AsymmetricEdge {
                    from: stage.id,
                    to: source,
                    declared_as: "depends_on",
                });
            }
        }
    }
    edges
}
