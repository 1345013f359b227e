//! Memory documents and the durable collaborators behind them.
//!
//! Three documents make up the pipeline's persistent state:
//! - **Session**: last input, last run, current persona (shallow-merged)
//! - **Project**: topic, run counter, stage highlights (shallow-merged)
//! - **ConceptGraph**: nodes and edges (replaced wholesale)
//!
//! Session and Project are open records: any key a stage chooses to merge
//! in is kept. The merge behaviour is carried by [`MergeStrategy`] so both
//! strategies can be exercised directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StorageError;
use crate::journal::{EventType, Scope};

/// An open JSON record. `serde_json::Map` keeps keys sorted, which makes
/// serialized documents byte-stable across writes.
pub type Record = serde_json::Map<String, Value>;

/// Which of the three documents an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Session,
    Project,
    ConceptGraph,
}

impl DocumentKind {
    /// Flush order used by a full synchronization.
    pub const SYNC_ORDER: [DocumentKind; 3] = [
        DocumentKind::Session,
        DocumentKind::Project,
        DocumentKind::ConceptGraph,
    ];

    /// Name of the durable document.
    pub fn storage_name(self) -> &'static str {
        match self {
            DocumentKind::Session => "session",
            DocumentKind::Project => "project",
            DocumentKind::ConceptGraph => "concept-graph",
        }
    }

    pub fn merge_strategy(self) -> MergeStrategy {
        match self {
            DocumentKind::Session | DocumentKind::Project => MergeStrategy::ShallowMerge,
            DocumentKind::ConceptGraph => MergeStrategy::Replace,
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            DocumentKind::Session => Scope::Session,
            DocumentKind::Project => Scope::Project,
            DocumentKind::ConceptGraph => Scope::ConceptGraph,
        }
    }

    /// Journal event emitted by a save of this document.
    pub fn update_event(self) -> EventType {
        match self {
            DocumentKind::Session => EventType::SessionUpdate,
            DocumentKind::Project => EventType::ProjectUpdate,
            DocumentKind::ConceptGraph => EventType::ConceptGraphUpdate,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "session" => Some(DocumentKind::Session),
            "project" => Some(DocumentKind::Project),
            "concept-graph" | "conceptGraph" | "concept_graph" | "graph" => {
                Some(DocumentKind::ConceptGraph)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

/// How a patch combines with the in-process document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// `{...current, ...patch}`. Nested values are replaced, not merged.
    ShallowMerge,
    /// The patch becomes the document.
    Replace,
}

impl MergeStrategy {
    pub fn apply(self, current: &Value, patch: Value) -> Value {
        match self {
            MergeStrategy::Replace => patch,
            MergeStrategy::ShallowMerge => {
                let mut merged = current.as_object().cloned().unwrap_or_default();
                match patch {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            merged.insert(key, value);
                        }
                    }
                    Value::Null => {}
                    other => return other,
                }
                Value::Object(merged)
            }
        }
    }
}

/// Per-session state: what ran last and under which persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionMemory(pub Record);

impl SessionMemory {
    pub const LAST_INPUT: &'static str = "lastInput";
    pub const LAST_RUN_AT: &'static str = "lastRunAt";
    pub const LAST_PIPELINE: &'static str = "lastPipeline";
    pub const CURRENT_PERSONA_ID: &'static str = "currentPersonaId";

    pub fn last_input(&self) -> Option<&str> {
        self.0.get(Self::LAST_INPUT).and_then(Value::as_str)
    }

    pub fn last_run_at(&self) -> Option<&str> {
        self.0.get(Self::LAST_RUN_AT).and_then(Value::as_str)
    }

    pub fn last_pipeline(&self) -> Option<&Value> {
        self.0.get(Self::LAST_PIPELINE)
    }

    pub fn current_persona_id(&self) -> Option<&str> {
        self.0.get(Self::CURRENT_PERSONA_ID).and_then(Value::as_str)
    }

    pub fn record(&self) -> &Record {
        &self.0
    }
}

/// Long-lived project state accumulated across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMemory(pub Record);

impl ProjectMemory {
    pub const CURRENT_TOPIC: &'static str = "currentTopic";
    pub const RUNS_COUNT: &'static str = "runsCount";
    pub const LAST_CONCEPTS: &'static str = "lastConcepts";
    pub const LAST_THEMES: &'static str = "lastThemes";
    pub const LAST_REASONING: &'static str = "lastReasoning";

    pub fn current_topic(&self) -> Option<&str> {
        self.0.get(Self::CURRENT_TOPIC).and_then(Value::as_str)
    }

    pub fn runs_count(&self) -> Option<u64> {
        self.0.get(Self::RUNS_COUNT).and_then(Value::as_u64)
    }

    pub fn record(&self) -> &Record {
        &self.0
    }
}

/// The concept graph. Node payloads and edges are opaque JSON so graphs
/// written by other tools survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
    #[serde(flatten)]
    pub extra: Record,
}

impl ConceptGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Durable local storage: one JSON value per document name.
///
/// Implementations: file directory, in-memory (for testing).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Read a document. A missing document is `Ok(None)`, not an error.
    async fn read(&self, name: &str) -> std::result::Result<Option<Value>, StorageError>;

    /// Write (overwrite) a document.
    async fn write(&self, name: &str, value: &Value) -> std::result::Result<(), StorageError>;
}

/// Where a mirrored copy ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorReceipt {
    pub bucket: String,
    pub filename: String,
    pub location: String,
}

/// Secondary "remote" copy of the documents, keyed by `(bucket, filename)`.
///
/// Best-effort from the memory store's point of view.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(
        &self,
        bucket: &str,
        filename: &str,
        value: &Value,
    ) -> std::result::Result<MirrorReceipt, StorageError>;

    async fn download(
        &self,
        bucket: &str,
        filename: &str,
    ) -> std::result::Result<Option<Value>, StorageError>;
}
