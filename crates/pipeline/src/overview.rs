//! Dashboard overview: a compact read model over the three documents.

use iqraa_core::memory::ProjectMemory;
use iqraa_core::persona::{MemoryMode, Persona};
use iqraa_memory::MemoryStore;
use serde::Serialize;
use serde_json::Value;

use crate::personas::resolve_with_default;

pub const SNIPPET_CHARS: usize = 220;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub memory_mode: MemoryMode,
}

impl From<&'static Persona> for PersonaSummary {
    fn from(p: &'static Persona) -> Self {
        Self {
            id: p.id,
            name: p.name,
            title: p.title,
            memory_mode: p.memory_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub persona: PersonaSummary,
    pub last_run_at: Option<String>,
    pub last_input_snippet: Option<String>,
    pub last_insight_snippet: Option<String>,
    pub runs_count: u64,
}

/// Summarize the store as currently held in process. Reads nothing from disk.
pub fn dashboard_overview(store: &MemoryStore, default_persona: Option<&str>) -> DashboardOverview {
    let session = store.session();
    let persona = resolve_with_default(session.current_persona_id(), default_persona);

    let insight = session
        .last_pipeline()
        .and_then(|p| p.get("insight"))
        .and_then(|i| {
            i.get("summary")
                .and_then(Value::as_str)
                .or_else(|| i.get("fallback").and_then(Value::as_str))
        });

    let runs_count = store
        .project()
        .runs_count()
        .or_else(|| {
            session
                .record()
                .get(ProjectMemory::RUNS_COUNT)
                .and_then(Value::as_u64)
        })
        .unwrap_or(0);

    DashboardOverview {
        persona: persona.into(),
        last_run_at: session.last_run_at().map(str::to_string),
        last_input_snippet: session.last_input().map(|s| snippet(s, SNIPPET_CHARS)),
        last_insight_snippet: insight.map(|s| snippet(s, SNIPPET_CHARS)),
        runs_count,
    }
}

/// First `max_chars` characters, with `…` appended when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}…", &text[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::DEFAULT_PERSONA_ID;
    use crate::test_helpers::memory_harness;
    use iqraa_core::journal::Actor;
    use iqraa_core::memory::Record;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn snippet_cuts_with_ellipsis() {
        assert_eq!(snippet("short", 220), "short");
        assert_eq!(snippet("abcdef", 3), "abc…");
    }

    #[test]
    fn fresh_store_overview_uses_defaults() {
        let h = memory_harness();
        let o = dashboard_overview(&h.store, None);
        assert_eq!(o.persona.id, DEFAULT_PERSONA_ID);
        assert_eq!(o.runs_count, 0);
        assert!(o.last_run_at.is_none());
        assert!(o.last_insight_snippet.is_none());
    }

    #[tokio::test]
    async fn overview_reads_session_and_project() {
        let mut h = memory_harness();
        let long_input = "x".repeat(300);
        h.store
            .save_session(
                record(json!({
                    "currentPersonaId": "media-architect",
                    "lastInput": long_input,
                    "lastRunAt": "2026-01-01T00:00:00Z",
                    "lastPipeline": {"insight": {"summary": null, "fallback": "raw insight"}}
                })),
                Actor::Pipeline,
                None,
            )
            .await
            .unwrap();
        h.store
            .save_project(record(json!({"runsCount": 4})), Actor::Pipeline, None)
            .await
            .unwrap();

        let o = dashboard_overview(&h.store, None);
        assert_eq!(o.persona.id, "media-architect");
        assert_eq!(o.runs_count, 4);
        assert_eq!(o.last_insight_snippet.as_deref(), Some("raw insight"));
        let input = o.last_input_snippet.unwrap();
        assert_eq!(input.chars().count(), SNIPPET_CHARS + 1);
        assert!(input.ends_with('…'));
    }

    #[test]
    fn serializes_camel_case() {
        let h = memory_harness();
        let json = serde_json::to_value(dashboard_overview(&h.store, None)).unwrap();
        assert_eq!(json["persona"]["memoryMode"], "aggressive");
        assert_eq!(json["runsCount"], 0);
    }
}
