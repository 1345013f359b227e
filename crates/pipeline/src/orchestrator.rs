//! The run orchestrator.
//!
//! One run: load memory, resolve and persist the persona, execute the fixed
//! stage plan, record the run in Session, push highlights through the
//! integration hooks, then synchronize every document.
//!
//! Stage failures never abort a run (executors degrade instead). Only
//! durable-write and journal-append failures propagate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use iqraa_core::error::PipelineError;
use iqraa_core::generation::TextGenerator;
use iqraa_core::journal::Actor;
use iqraa_core::memory::{Record, SessionMemory};
use iqraa_core::persona::Persona;
use iqraa_core::stage::StageKind;
use iqraa_memory::{MemoryStore, SyncReport};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::executor::{
    AnalyticsResult, ExpansionResult, InsightResult, PlanResult, ReasoningResult, StageExecutor,
    StageOutput,
};
use crate::hooks;
use crate::intake::{primary_intake, PrimaryIntake};
use crate::overview::{dashboard_overview, DashboardOverview};
use crate::personas::{get_persona, resolve_with_default};
use crate::prompt::PipelineContext;
use crate::stages::RUN_PLAN;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub persona_id: Option<String>,
}

impl RunOptions {
    pub fn with_persona(persona_id: impl Into<String>) -> Self {
        Self {
            persona_id: Some(persona_id.into()),
        }
    }
}

/// Every stage output of one run, plus the persona it ran under.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub persona: &'static Persona,
    pub primary: PrimaryIntake,
    pub expansion: ExpansionResult,
    pub analytics: AnalyticsResult,
    pub reasoning: ReasoningResult,
    pub insight: InsightResult,
    pub completed_at: DateTime<Utc>,
    pub sync: SyncReport,
}

impl PipelineResult {
    /// Number of generative stages that returned a degraded result.
    pub fn degraded_stages(&self) -> usize {
        [
            self.expansion.is_degraded(),
            self.analytics.is_degraded(),
            self.reasoning.is_degraded(),
            self.insight.is_degraded(),
        ]
        .into_iter()
        .filter(|d| *d)
        .count()
    }
}

/// Result of a standalone planning pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutcome {
    pub persona: &'static Persona,
    pub expansion: ExpansionResult,
    pub plan: PlanResult,
}

/// The run record merged into Session as `lastPipeline`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunRecord<'a> {
    run_id: Uuid,
    persona_id: &'static str,
    primary: &'a PrimaryIntake,
    expansion: &'a ExpansionResult,
    analytics: &'a AnalyticsResult,
    reasoning: &'a ReasoningResult,
    insight: &'a InsightResult,
}

const NOT_RUN: &str = "[stage not run]";

/// Outputs collected while executing a stage plan.
#[derive(Default)]
struct StageOutputs {
    expansion: Option<ExpansionResult>,
    analytics: Option<AnalyticsResult>,
    reasoning: Option<ReasoningResult>,
    insight: Option<InsightResult>,
}

impl StageOutputs {
    fn finish(self) -> (ExpansionResult, AnalyticsResult, ReasoningResult, InsightResult) {
        (
            self.expansion.unwrap_or_else(not_run),
            self.analytics.unwrap_or_else(not_run),
            self.reasoning.unwrap_or_else(not_run),
            self.insight.unwrap_or_else(not_run),
        )
    }
}

fn not_run<T: StageOutput>() -> T {
    T::degraded(NOT_RUN.into())
}

/// The output of a stage that ran, or a degraded stand-in.
fn ran<T: StageOutput + Clone>(slot: &Option<T>) -> T {
    slot.clone().unwrap_or_else(not_run)
}

pub struct Orchestrator {
    executor: StageExecutor,
    default_persona: Option<String>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("generator", &self.executor.generator_name())
            .field("default_persona", &self.default_persona)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            executor: StageExecutor::new(generator),
            default_persona: None,
        }
    }

    /// Use `persona_id` instead of the built-in default when a run names no
    /// known persona. Unknown ids are ignored with a warning.
    pub fn with_default_persona(mut self, persona_id: Option<String>) -> Self {
        if let Some(id) = &persona_id {
            if get_persona(id).is_none() {
                warn!(persona = %id, "Configured default persona is unknown, using built-in default");
            }
        }
        self.default_persona = persona_id;
        self
    }

    pub fn generator_name(&self) -> &str {
        self.executor.generator_name()
    }

    fn resolve(&self, requested: Option<&str>) -> &'static Persona {
        resolve_with_default(requested, self.default_persona.as_deref())
    }

    /// Execute one full run against `store`.
    pub async fn run(
        &self,
        store: &mut MemoryStore,
        input: &str,
        options: RunOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let run_id = Uuid::new_v4();
        store.load_all().await?;

        let requested = options
            .persona_id
            .or_else(|| store.session().current_persona_id().map(str::to_string));
        let persona = self.resolve(requested.as_deref());
        info!(%run_id, persona = persona.id, generator = self.generator_name(), "Pipeline run started");

        let mut patch = Record::new();
        patch.insert(SessionMemory::CURRENT_PERSONA_ID.into(), Value::from(persona.id));
        store
            .save_session(patch, Actor::Pipeline, Some("persona resolved".into()))
            .await?;

        let primary = primary_intake(input);
        debug!(%run_id, words = primary.word_count, language = %primary.language, "Primary intake done");

        let (expansion, analytics, reasoning, insight) = {
            let ctx = PipelineContext::from_store(input, persona, store);
            self.execute_plan(&RUN_PLAN, &ctx).await.finish()
        };

        let completed_at = Utc::now();
        let record = RunRecord {
            run_id,
            persona_id: persona.id,
            primary: &primary,
            expansion: &expansion,
            analytics: &analytics,
            reasoning: &reasoning,
            insight: &insight,
        };
        let mut summary = Record::new();
        summary.insert(SessionMemory::LAST_INPUT.into(), Value::from(input));
        summary.insert(
            SessionMemory::LAST_RUN_AT.into(),
            Value::from(completed_at.to_rfc3339()),
        );
        summary.insert(
            SessionMemory::LAST_PIPELINE.into(),
            serde_json::to_value(&record)?,
        );
        store
            .save_session(summary, Actor::Pipeline, Some("pipeline run".into()))
            .await?;

        hooks::on_expanded(store, persona, &expansion).await?;
        hooks::on_reasoned(store, &reasoning).await?;

        let sync = store.sync_all(Actor::Pipeline).await?;

        let result = PipelineResult {
            run_id,
            persona,
            primary,
            expansion,
            analytics,
            reasoning,
            insight,
            completed_at,
            sync,
        };
        info!(
            %run_id,
            persona = persona.id,
            degraded_stages = result.degraded_stages(),
            "Pipeline run complete"
        );
        Ok(result)
    }

    /// Execute the generative stages of `plan` in order. A stage whose
    /// upstream did not run sees that upstream as degraded.
    async fn execute_plan(&self, plan: &[StageKind], ctx: &PipelineContext<'_>) -> StageOutputs {
        let mut out = StageOutputs::default();
        for &kind in plan {
            debug!(stage = kind.as_str(), "Executing stage");
            match kind {
                StageKind::Expansion => out.expansion = Some(self.executor.expand(ctx).await),
                StageKind::Analytics => {
                    let expansion = ran(&out.expansion);
                    out.analytics = Some(self.executor.analyze(ctx, &expansion).await);
                }
                StageKind::Reasoning => {
                    let expansion = ran(&out.expansion);
                    let analytics = ran(&out.analytics);
                    out.reasoning = Some(self.executor.reason(ctx, &expansion, &analytics).await);
                }
                StageKind::Synthesis => {
                    let expansion = ran(&out.expansion);
                    let analytics = ran(&out.analytics);
                    let reasoning = ran(&out.reasoning);
                    out.insight = Some(
                        self.executor
                            .synthesize(ctx, &expansion, &analytics, &reasoning)
                            .await,
                    );
                }
                StageKind::Planning => {
                    warn!("Planning is not part of a run; use plan() instead");
                }
            }
        }
        out
    }

    /// Expansion followed by task planning. Writes no document.
    pub async fn plan(
        &self,
        store: &mut MemoryStore,
        input: &str,
        options: RunOptions,
    ) -> Result<PlanOutcome, PipelineError> {
        store.load_all().await?;
        let requested = options
            .persona_id
            .or_else(|| store.session().current_persona_id().map(str::to_string));
        let persona = self.resolve(requested.as_deref());

        let ctx = PipelineContext::from_store(input, persona, store);
        let expansion = self.executor.expand(&ctx).await;
        let plan = self.executor.plan(&ctx, &expansion).await;
        info!(persona = persona.id, steps = plan.steps.len(), "Plan generated");

        Ok(PlanOutcome {
            persona,
            expansion,
            plan,
        })
    }

    /// Make `persona_id` the session's persona. Unknown ids are an error.
    pub async fn select_persona(
        &self,
        store: &mut MemoryStore,
        persona_id: &str,
    ) -> Result<&'static Persona, PipelineError> {
        let persona =
            get_persona(persona_id).ok_or_else(|| PipelineError::UnknownPersona(persona_id.to_string()))?;

        store.load_all().await?;
        let mut patch = Record::new();
        patch.insert(SessionMemory::CURRENT_PERSONA_ID.into(), Value::from(persona.id));
        store
            .save_session(patch, Actor::User, Some("persona selected".into()))
            .await?;
        store.sync_all(Actor::User).await?;

        info!(persona = persona.id, "Persona selected");
        Ok(persona)
    }

    /// The session's persona under the fallback rule.
    pub fn current_persona(&self, store: &MemoryStore) -> &'static Persona {
        self.resolve(store.session().current_persona_id())
    }

    pub fn overview(&self, store: &MemoryStore) -> DashboardOverview {
        dashboard_overview(store, self.default_persona.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::{default_persona, DEFAULT_PERSONA_ID};
    use crate::test_helpers::{
        memory_harness, ScriptedGenerator, ANALYTICS_JSON, EXPANSION_JSON, INSIGHT_JSON,
        REASONING_JSON,
    };
    use iqraa_core::journal::EventType;
    use iqraa_core::memory::ProjectMemory;

    fn scripted_run() -> Arc<ScriptedGenerator> {
        Arc::new(ScriptedGenerator::new(vec![
            EXPANSION_JSON,
            ANALYTICS_JSON,
            REASONING_JSON,
            INSIGHT_JSON,
        ]))
    }

    fn event_types(store: &MemoryStore) -> Vec<EventType> {
        store
            .journal()
            .read_events()
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }

    #[tokio::test]
    async fn full_run_threads_outputs_and_updates_memory() {
        let mut h = memory_harness();
        let generator = scripted_run();
        let orchestrator = Orchestrator::new(generator.clone());

        let result = orchestrator
            .run(&mut h.store, "Justice builds trust.", RunOptions::default())
            .await
            .unwrap();

        assert_eq!(generator.call_count(), 4);
        assert_eq!(result.persona.id, DEFAULT_PERSONA_ID);
        assert_eq!(result.degraded_stages(), 0);
        assert_eq!(result.insight.title.as_deref(), Some("Justice as trust"));
        assert_eq!(result.primary.sentence_count, 1);

        // Expansion summary reaches analytics, reasoning and synthesis
        let requests = generator.requests();
        for req in &requests[1..] {
            assert!(req.user_prompt.contains("Institutions earn trust through justice."));
        }
        // Reasoning reaches synthesis
        assert!(requests[3].user_prompt.contains("Trust follows from consistent justice."));

        let session = h.store.session();
        assert_eq!(session.last_input(), Some("Justice builds trust."));
        assert_eq!(session.current_persona_id(), Some(DEFAULT_PERSONA_ID));
        let pipeline = session.last_pipeline().unwrap();
        assert_eq!(pipeline["runId"], result.run_id.to_string());
        assert_eq!(pipeline["personaId"], DEFAULT_PERSONA_ID);

        let project = h.store.project();
        assert_eq!(project.runs_count(), Some(1));
        assert_eq!(
            project.0[ProjectMemory::LAST_REASONING],
            "Trust follows from consistent justice."
        );
        // Aggressive default persona: 3 concepts + 1 theme
        assert_eq!(h.store.concept_graph().node_count(), 4);
    }

    #[tokio::test]
    async fn run_journal_follows_the_state_machine() {
        let mut h = memory_harness();
        Orchestrator::new(scripted_run())
            .run(&mut h.store, "text", RunOptions::default())
            .await
            .unwrap();

        assert_eq!(
            event_types(&h.store),
            vec![
                EventType::SessionUpdate,      // persona resolved
                EventType::SessionUpdate,      // run summary
                EventType::ProjectUpdate,      // expansion highlights
                EventType::ConceptGraphUpdate, // concept capture
                EventType::ProjectUpdate,      // reasoning highlight
                EventType::SyncStart,
                EventType::SyncComplete,
            ]
        );
    }

    #[tokio::test]
    async fn unparsable_generator_still_yields_every_stage() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("plain prose, no JSON")));

        let result = orchestrator
            .run(&mut h.store, "some input", RunOptions::default())
            .await
            .unwrap();

        assert_eq!(result.degraded_stages(), 4);
        assert_eq!(result.primary.word_count, 2);
        assert_eq!(result.expansion.fallback.as_deref(), Some("plain prose, no JSON"));
        assert_eq!(result.analytics.flags.len(), 1);
        assert!(result.reasoning.is_degraded());
        assert_eq!(result.insight.summary_text(), Some("plain prose, no JSON"));
        // Nothing to capture: only the project update from on_expanded, no graph save
        assert!(!event_types(&h.store).contains(&EventType::ConceptGraphUpdate));
    }

    #[tokio::test]
    async fn generator_failures_do_not_abort_the_run() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::failing(4)));
        let result = orchestrator
            .run(&mut h.store, "text", RunOptions::default())
            .await
            .unwrap();
        assert_eq!(result.degraded_stages(), 4);
    }

    #[tokio::test]
    async fn unknown_persona_falls_back_to_default() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")));
        let result = orchestrator
            .run(&mut h.store, "text", RunOptions::with_persona("nonexistent-id"))
            .await
            .unwrap();
        assert_eq!(result.persona.id, DEFAULT_PERSONA_ID);
    }

    #[tokio::test]
    async fn session_persona_is_used_when_none_requested() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")));
        orchestrator
            .select_persona(&mut h.store, "policy-strategist")
            .await
            .unwrap();
        let result = orchestrator
            .run(&mut h.store, "text", RunOptions::default())
            .await
            .unwrap();
        assert_eq!(result.persona.id, "policy-strategist");
    }

    #[tokio::test]
    async fn configured_default_persona_applies() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")))
            .with_default_persona(Some("value-philosopher".into()));
        let result = orchestrator
            .run(&mut h.store, "text", RunOptions::default())
            .await
            .unwrap();
        assert_eq!(result.persona.id, "value-philosopher");
        assert_eq!(orchestrator.current_persona(&h.store).id, "value-philosopher");
    }

    #[tokio::test]
    async fn select_unknown_persona_is_an_error_and_writes_nothing() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")));
        let err = orchestrator
            .select_persona(&mut h.store, "nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownPersona(id) if id == "nobody"));
        assert!(event_types(&h.store).is_empty());
    }

    #[tokio::test]
    async fn select_persona_saves_then_syncs() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")));
        let persona = orchestrator
            .select_persona(&mut h.store, "media-architect")
            .await
            .unwrap();
        assert_eq!(persona.id, "media-architect");

        let entries = h.store.journal().read_events().unwrap();
        assert_eq!(entries[0].actor, Actor::User);
        assert_eq!(
            event_types(&h.store),
            vec![EventType::SessionUpdate, EventType::SyncStart, EventType::SyncComplete]
        );
        assert_eq!(orchestrator.current_persona(&h.store).id, "media-architect");
    }

    #[tokio::test]
    async fn plan_writes_no_documents() {
        let mut h = memory_harness();
        let generator = Arc::new(ScriptedGenerator::new(vec![
            EXPANSION_JSON,
            r#"{"summary": "two steps", "steps": [{"title": "read", "priority": "high"}, {"title": "write"}]}"#,
        ]));
        let orchestrator = Orchestrator::new(generator.clone());

        let outcome = orchestrator
            .plan(&mut h.store, "plan a reform", RunOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.plan.steps.len(), 2);
        assert!(generator.requests()[1]
            .user_prompt
            .contains("Institutions earn trust through justice."));
        assert!(event_types(&h.store).is_empty());
        assert!(h.durable.write_log().await.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut h = memory_harness();
        h.durable.set_fail_writes(true);
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat("x")));
        let err = orchestrator
            .run(&mut h.store, "text", RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
    }

    #[tokio::test]
    async fn consecutive_runs_count_up() {
        let mut h = memory_harness();
        let orchestrator = Orchestrator::new(Arc::new(ScriptedGenerator::repeat(EXPANSION_JSON)));
        for _ in 0..3 {
            orchestrator
                .run(&mut h.store, "text", RunOptions::default())
                .await
                .unwrap();
        }
        assert_eq!(h.store.project().runs_count(), Some(3));
        assert_eq!(orchestrator.overview(&h.store).runs_count, 3);
    }

    #[tokio::test]
    async fn run_follows_run_plan_order() {
        let mut h = memory_harness();
        let generator = scripted_run();
        let orchestrator = Orchestrator::new(generator.clone());
        orchestrator
            .run(&mut h.store, "Justice builds trust.", RunOptions::default())
            .await
            .unwrap();

        let requests = generator.requests();
        assert_eq!(requests.len(), RUN_PLAN.len());

        let fresh = memory_harness();
        let ctx = PipelineContext::from_store("x", default_persona(), &fresh.store);
        for (kind, request) in RUN_PLAN.iter().zip(&requests) {
            let expected = crate::prompt::build(*kind, &ctx, &Default::default());
            assert_eq!(request.system_prompt, expected.system_prompt, "{kind}");
        }
    }

    #[tokio::test]
    async fn stages_outside_the_plan_come_back_degraded() {
        let h = memory_harness();
        let generator = Arc::new(ScriptedGenerator::new(vec![EXPANSION_JSON]));
        let orchestrator = Orchestrator::new(generator.clone());
        let ctx = PipelineContext::from_store("text", default_persona(), &h.store);

        let (expansion, analytics, reasoning, insight) = orchestrator
            .execute_plan(&[StageKind::Expansion], &ctx)
            .await
            .finish();

        assert_eq!(generator.call_count(), 1);
        assert!(!expansion.is_degraded());
        assert_eq!(analytics.fallback.as_deref(), Some(NOT_RUN));
        assert_eq!(reasoning.fallback.as_deref(), Some(NOT_RUN));
        assert_eq!(insight.fallback.as_deref(), Some(NOT_RUN));
    }
}
