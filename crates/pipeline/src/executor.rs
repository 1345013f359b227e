//! Stage executors.
//!
//! Each generative stage builds its prompt, calls the generator once, and
//! parses the reply into a typed result. A reply that cannot be parsed, or
//! a generator that fails outright, yields a degraded result carrying the
//! raw text in `fallback`. Executors never return an error.

use std::sync::Arc;

use iqraa_core::generation::TextGenerator;
use iqraa_core::persona::Persona;
use iqraa_core::stage::StageKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::prompt::{self, PipelineContext, Upstream};

pub const ANALYTICS_DEGRADED_FLAG: &str = "could not interpret engine output; review the prompt";
pub const INSIGHT_DEGRADED_TITLE: &str = "Insight (raw)";

// ── Result types ───────────────────────────────────────────────────────────

/// A structured stage result with a raw-text degraded form.
pub trait StageOutput: DeserializeOwned + Serialize + Send {
    const KIND: StageKind;

    /// The result for a reply that could not be interpreted.
    fn degraded(raw: String) -> Self;

    /// Post-parse cleanup. Called only on successfully parsed results.
    fn normalize(&mut self, _persona: &Persona) {}

    fn is_degraded(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionResult {
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ExpansionResult {
    /// The summary threaded to later stages: the parsed summary, else the raw text.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().or(self.fallback.as_deref())
    }
}

impl StageOutput for ExpansionResult {
    const KIND: StageKind = StageKind::Expansion;

    fn degraded(raw: String) -> Self {
        Self {
            fallback: Some(raw),
            ..Self::default()
        }
    }

    fn normalize(&mut self, _persona: &Persona) {
        self.concepts = clean_labels(std::mem::take(&mut self.concepts));
        self.themes = clean_labels(std::mem::take(&mut self.themes));
    }

    fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub coherence: Option<f64>,
    #[serde(default)]
    pub complexity: Option<f64>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Persona-weighted mean of the three metrics, when all are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl AnalyticsResult {
    pub fn notes_text(&self) -> Option<&str> {
        self.notes.as_deref().or(self.fallback.as_deref())
    }
}

impl StageOutput for AnalyticsResult {
    const KIND: StageKind = StageKind::Analytics;

    fn degraded(raw: String) -> Self {
        Self {
            flags: vec![ANALYTICS_DEGRADED_FLAG.to_string()],
            fallback: Some(raw),
            ..Self::default()
        }
    }

    fn normalize(&mut self, persona: &Persona) {
        for metric in [&mut self.density, &mut self.coherence, &mut self.complexity] {
            *metric = metric.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0));
        }
        self.weighted_score = match (self.density, self.coherence, self.complexity) {
            (Some(d), Some(c), Some(x)) => persona.cognitive_weights.weighted_score(d, c, x),
            _ => None,
        };
    }

    fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl StageOutput for PlanResult {
    const KIND: StageKind = StageKind::Planning;

    fn degraded(raw: String) -> Self {
        Self {
            fallback: Some(raw),
            ..Self::default()
        }
    }

    fn normalize(&mut self, _persona: &Persona) {
        self.steps.retain(|s| !s.title.trim().is_empty());
        for (i, step) in self.steps.iter_mut().enumerate() {
            if step.id.is_none() {
                step.id = Some(format!("step-{}", i + 1));
            }
        }
    }

    fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningResult {
    #[serde(default)]
    pub reasoning_text: Option<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub implications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ReasoningResult {
    pub fn text(&self) -> Option<&str> {
        self.reasoning_text.as_deref().or(self.fallback.as_deref())
    }
}

impl StageOutput for ReasoningResult {
    const KIND: StageKind = StageKind::Reasoning;

    fn degraded(raw: String) -> Self {
        Self {
            fallback: Some(raw),
            ..Self::default()
        }
    }

    fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl InsightResult {
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().or(self.fallback.as_deref())
    }
}

impl StageOutput for InsightResult {
    const KIND: StageKind = StageKind::Synthesis;

    fn degraded(raw: String) -> Self {
        Self {
            title: Some(INSIGHT_DEGRADED_TITLE.to_string()),
            fallback: Some(raw),
            ..Self::default()
        }
    }

    fn normalize(&mut self, _persona: &Persona) {
        self.tags = clean_labels(std::mem::take(&mut self.tags));
    }

    fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Trim, drop blanks, and drop repeats while keeping first-seen order.
fn clean_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

// ── Parsing ────────────────────────────────────────────────────────────────

/// Interpret generator text as a JSON object of shape `T`.
///
/// Tries, in order: the whole trimmed text, the body of a Markdown code
/// fence, and the outermost `{...}` span.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();
    let candidates = [Some(trimmed), fenced_body(trimmed), brace_span(trimmed)];
    candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        })
}

fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (`json`, `JSON`, ...) up to the first newline.
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ── Executor ───────────────────────────────────────────────────────────────

/// Runs generative stages against one generator.
#[derive(Clone)]
pub struct StageExecutor {
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor")
            .field("generator", &self.generator.name())
            .finish()
    }
}

impl StageExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Build the prompt for `T::KIND`, generate, and parse.
    pub async fn execute<T: StageOutput>(
        &self,
        ctx: &PipelineContext<'_>,
        upstream: &Upstream<'_>,
    ) -> T {
        let request = prompt::build(T::KIND, ctx, upstream);
        debug!(
            stage = %T::KIND,
            generator = self.generator.name(),
            user_prompt_chars = request.user_prompt.chars().count(),
            "Executing stage"
        );

        let raw = match self.generator.generate(request).await {
            Ok(response) => response.text,
            Err(e) => {
                warn!(stage = %T::KIND, error = %e, "Generation failed, degrading stage result");
                return T::degraded(format!("[generation failed] {e}"));
            }
        };

        match parse_structured::<T>(&raw) {
            Some(mut result) => {
                result.normalize(ctx.persona);
                result
            }
            None => {
                warn!(stage = %T::KIND, chars = raw.chars().count(), "Unstructured stage output, degrading");
                T::degraded(raw)
            }
        }
    }

    pub async fn expand(&self, ctx: &PipelineContext<'_>) -> ExpansionResult {
        self.execute(ctx, &Upstream::default()).await
    }

    pub async fn analyze(&self, ctx: &PipelineContext<'_>, expansion: &ExpansionResult) -> AnalyticsResult {
        let upstream = Upstream {
            expansion_summary: expansion.summary_text(),
            ..Upstream::default()
        };
        self.execute(ctx, &upstream).await
    }

    pub async fn plan(&self, ctx: &PipelineContext<'_>, expansion: &ExpansionResult) -> PlanResult {
        let upstream = Upstream {
            expansion_summary: expansion.summary_text(),
            ..Upstream::default()
        };
        self.execute(ctx, &upstream).await
    }

    pub async fn reason(
        &self,
        ctx: &PipelineContext<'_>,
        expansion: &ExpansionResult,
        analytics: &AnalyticsResult,
    ) -> ReasoningResult {
        let upstream = Upstream {
            expansion_summary: expansion.summary_text(),
            analytics_notes: analytics.notes_text(),
            reasoning_text: None,
        };
        self.execute(ctx, &upstream).await
    }

    pub async fn synthesize(
        &self,
        ctx: &PipelineContext<'_>,
        expansion: &ExpansionResult,
        analytics: &AnalyticsResult,
        reasoning: &ReasoningResult,
    ) -> InsightResult {
        let upstream = Upstream {
            expansion_summary: expansion.summary_text(),
            analytics_notes: analytics.notes_text(),
            reasoning_text: reasoning.text(),
        };
        self.execute(ctx, &upstream).await
    }
}
