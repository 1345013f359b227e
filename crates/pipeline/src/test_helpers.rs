//! Shared test helpers for pipeline tests.

use std::sync::{Arc, Mutex};

use iqraa_core::error::GenerationError;
use iqraa_core::generation::{GenerationRequest, GenerationResponse, TextGenerator};
use iqraa_memory::{ChangeJournal, InMemoryDocumentStore, InMemoryJournalSink, InMemoryMirror, MemoryStore, MirrorBuckets};

/// A generator that returns a sequence of scripted responses.
///
/// Each call to `generate` returns the next response in the queue. Once the
/// queue is exhausted it returns the `repeat` text if one was given, and
/// panics otherwise.
pub struct ScriptedGenerator {
    responses: Mutex<Vec<Result<String, GenerationError>>>,
    repeat: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn repeat(text: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            repeat: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with a network error.
    pub fn failing(calls: usize) -> Self {
        Self {
            responses: Mutex::new(
                (0..calls)
                    .map(|_| Err(GenerationError::Network("connection refused".into())))
                    .collect(),
            ),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return match &self.repeat {
                Some(text) => Ok(GenerationResponse { text: text.clone() }),
                None => panic!("ScriptedGenerator: no more responses (call #{call})"),
            };
        }
        responses.remove(0).map(|text| GenerationResponse { text })
    }
}

/// Handles onto an in-memory store's collaborators.
#[allow(dead_code)]
pub struct StoreHarness {
    pub store: MemoryStore,
    pub durable: Arc<InMemoryDocumentStore>,
    pub mirror: Arc<InMemoryMirror>,
    pub sink: Arc<InMemoryJournalSink>,
}

pub fn memory_harness() -> StoreHarness {
    let durable = Arc::new(InMemoryDocumentStore::default());
    let mirror = Arc::new(InMemoryMirror::default());
    let sink = Arc::new(InMemoryJournalSink::default());
    let journal = Arc::new(ChangeJournal::new(sink.clone()));
    let store = MemoryStore::new(durable.clone(), journal)
        .with_mirror(mirror.clone(), MirrorBuckets::default());
    StoreHarness {
        store,
        durable,
        mirror,
        sink,
    }
}

pub const EXPANSION_JSON: &str = r#"{"concepts": ["justice", "trust", "reform"], "themes": ["governance"], "summary": "Institutions earn trust through justice."}"#;
pub const ANALYTICS_JSON: &str = r#"{"density": 0.8, "coherence": 0.6, "complexity": 1.4, "flags": [], "notes": "Dense but coherent."}"#;
pub const REASONING_JSON: &str = r#"{"reasoningText": "Trust follows from consistent justice.", "assumptions": ["institutions are stable"], "implications": ["reform builds trust"]}"#;
pub const INSIGHT_JSON: &str = r#"{"title": "Justice as trust", "summary": "Consistent justice produces durable trust.", "recommendations": ["audit courts"], "tags": ["justice", "trust", "governance"]}"#;
