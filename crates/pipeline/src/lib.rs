//! The Iqraa staged pipeline.
//!
//! A run follows a fixed plan:
//!
//! 1. **Resolve** the persona (request, then session, then default) and
//!    persist it into Session
//! 2. **Intake** the raw text deterministically (stage 1)
//! 3. **Expand**, **analyze**, **reason** and **synthesize** through the
//!    generator, each stage seeing the summaries of the ones before it
//! 4. **Record** the run in Session and push highlights into Project and
//!    the concept graph
//! 5. **Synchronize** every document
//!
//! The stage registry and the router describe the wider twelve-stage graph;
//! neither drives execution.

pub mod executor;
pub mod hooks;
pub mod intake;
pub mod orchestrator;
pub mod overview;
pub mod personas;
pub mod prompt;
pub mod router;
pub mod stages;

#[cfg(test)]
mod test_helpers;

pub use executor::{
    AnalyticsResult, ExpansionResult, InsightResult, PlanResult, PlanStep, Priority,
    ReasoningResult, StageExecutor, StageOutput,
};
pub use intake::{primary_intake, PrimaryIntake};
pub use orchestrator::{Orchestrator, PipelineResult, PlanOutcome, RunOptions};
pub use overview::{dashboard_overview, DashboardOverview, PersonaSummary};
pub use personas::{get_persona, list_personas, resolve_persona, DEFAULT_PERSONA_ID};
pub use router::{route, route_plan, RoutePlan};
pub use stages::{asymmetric_edges, get_stage, list_stages, AsymmetricEdge};
