//! The versioned memory store.
//!
//! Holds the three documents in process, mirrors every mutation to durable
//! storage and (best effort) to a remote mirror, and appends one journal
//! entry per mutation.
//!
//! Save order is fixed: durable write, in-process commit, mirror, journal.
//! A failed durable write leaves the in-process document untouched; a failed
//! mirror upload is reported in the outcome and never aborts the save.

use chrono::{DateTime, Utc};
use iqraa_core::error::StorageError;
use iqraa_core::journal::Actor;
use iqraa_core::memory::{
    ConceptGraph, DocumentKind, DocumentStore, MirrorReceipt, ProjectMemory, Record, RemoteMirror,
    SessionMemory,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::diff::{changed_concepts, value_key_diff};
use crate::journal::ChangeJournal;

/// Mirror buckets, one for session/project and one for the concept graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorBuckets {
    pub main: String,
    pub concept: String,
}

impl Default for MirrorBuckets {
    fn default() -> Self {
        Self {
            main: "iqraa-dashboard-memory".into(),
            concept: "concept-graph-memory".into(),
        }
    }
}

impl MirrorBuckets {
    pub fn for_kind(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::ConceptGraph => &self.concept,
            DocumentKind::Session | DocumentKind::Project => &self.main,
        }
    }
}

/// What happened to the remote copy of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MirrorOutcome {
    Mirrored { receipt: MirrorReceipt },
    Failed { reason: String },
    Disabled,
}

impl MirrorOutcome {
    pub fn is_mirrored(&self) -> bool {
        matches!(self, MirrorOutcome::Mirrored { .. })
    }
}

/// Result of a successful save: the committed document plus the separate,
/// non-fatal mirror outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub document: DocumentKind,
    pub committed: Value,
    pub mirror: MirrorOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMirror {
    pub document: DocumentKind,
    pub mirror: MirrorOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced_at: DateTime<Utc>,
    pub documents: Vec<DocumentMirror>,
}

/// A decoded document ready to be installed.
enum Staged {
    Session(SessionMemory),
    Project(ProjectMemory),
    ConceptGraph(ConceptGraph),
}

pub struct MemoryStore {
    session: SessionMemory,
    project: ProjectMemory,
    concept_graph: ConceptGraph,
    durable: Arc<dyn DocumentStore>,
    mirror: Option<Arc<dyn RemoteMirror>>,
    buckets: MirrorBuckets,
    journal: Arc<ChangeJournal>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("durable", &self.durable.name())
            .field("mirror", &self.mirror.as_ref().map(|m| m.name().to_string()))
            .field("buckets", &self.buckets)
            .field("journal", &self.journal)
            .finish()
    }
}

impl MemoryStore {
    /// A store with empty documents and no mirror.
    pub fn new(durable: Arc<dyn DocumentStore>, journal: Arc<ChangeJournal>) -> Self {
        Self {
            session: SessionMemory::default(),
            project: ProjectMemory::default(),
            concept_graph: ConceptGraph::default(),
            durable,
            mirror: None,
            buckets: MirrorBuckets::default(),
            journal,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>, buckets: MirrorBuckets) -> Self {
        self.mirror = Some(mirror);
        self.buckets = buckets;
        self
    }

    pub fn session(&self) -> &SessionMemory {
        &self.session
    }

    pub fn project(&self) -> &ProjectMemory {
        &self.project
    }

    pub fn concept_graph(&self) -> &ConceptGraph {
        &self.concept_graph
    }

    pub fn journal(&self) -> &Arc<ChangeJournal> {
        &self.journal
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    /// The in-process value of a document.
    pub fn snapshot(&self, kind: DocumentKind) -> Result<Value, StorageError> {
        let encoded = match kind {
            DocumentKind::Session => serde_json::to_value(&self.session),
            DocumentKind::Project => serde_json::to_value(&self.project),
            DocumentKind::ConceptGraph => serde_json::to_value(&self.concept_graph),
        };
        encoded.map_err(|e| StorageError::Encode {
            name: kind.storage_name().into(),
            reason: e.to_string(),
        })
    }

    // ── Loading ──

    /// Refresh one document from durable storage.
    ///
    /// A missing document leaves the in-process value unchanged. An unreadable
    /// or undecodable one does too, after a warning and a `memory:error`
    /// journal entry. Only a journal failure is returned as an error.
    pub async fn load(&mut self, kind: DocumentKind) -> Result<Value, StorageError> {
        let name = kind.storage_name();
        let failure = match self.durable.read(name).await {
            Ok(None) => None,
            Ok(Some(value)) => match decode(kind, value) {
                Ok(staged) => {
                    self.install(staged);
                    debug!(document = %kind, "Document loaded");
                    None
                }
                Err(e) => Some(e.to_string()),
            },
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = failure {
            warn!(document = %kind, error = %reason, "Keeping in-process document after failed load");
            self.journal.log_error(
                kind.scope(),
                format!("failed to load {name}"),
                json!({ "document": name, "error": reason }),
            )?;
        }

        self.snapshot(kind)
    }

    /// Load all three documents, in sync order.
    pub async fn load_all(&mut self) -> Result<(), StorageError> {
        for kind in DocumentKind::SYNC_ORDER {
            self.load(kind).await?;
        }
        Ok(())
    }

    // ── Saving ──

    pub async fn save_session(
        &mut self,
        patch: Record,
        actor: Actor,
        note: Option<String>,
    ) -> Result<SaveOutcome, StorageError> {
        self.save(DocumentKind::Session, Value::Object(patch), actor, note)
            .await
    }

    pub async fn save_project(
        &mut self,
        patch: Record,
        actor: Actor,
        note: Option<String>,
    ) -> Result<SaveOutcome, StorageError> {
        self.save(DocumentKind::Project, Value::Object(patch), actor, note)
            .await
    }

    pub async fn save_concept_graph(
        &mut self,
        graph: ConceptGraph,
        actor: Actor,
        note: Option<String>,
    ) -> Result<SaveOutcome, StorageError> {
        let value = serde_json::to_value(&graph).map_err(|e| StorageError::Encode {
            name: DocumentKind::ConceptGraph.storage_name().into(),
            reason: e.to_string(),
        })?;
        self.save(DocumentKind::ConceptGraph, value, actor, note).await
    }

    /// Apply `patch` with the document's merge strategy, then persist, mirror
    /// and journal the result. Exactly one journal entry per call.
    pub async fn save(
        &mut self,
        kind: DocumentKind,
        patch: Value,
        actor: Actor,
        note: Option<String>,
    ) -> Result<SaveOutcome, StorageError> {
        let before = self.snapshot(kind)?;
        let after = kind.merge_strategy().apply(&before, patch);
        let staged = decode(kind, after.clone())?;

        self.durable.write(kind.storage_name(), &after).await?;
        let previous_graph = match &staged {
            Staged::ConceptGraph(_) => Some(self.concept_graph.clone()),
            _ => None,
        };
        self.install(staged);
        debug!(document = %kind, actor = actor.as_str(), "Document saved");

        let mirror = self.mirror_document(kind, &after).await;

        match kind {
            DocumentKind::Session => {
                let diff = value_key_diff(&before, &after);
                self.journal.log_document_update(
                    kind,
                    actor,
                    note,
                    session_summary(&before),
                    session_summary(&after),
                    Some(diff),
                    None,
                    None,
                )?;
            }
            DocumentKind::Project => {
                let diff = value_key_diff(&before, &after);
                self.journal.log_document_update(
                    kind,
                    actor,
                    note,
                    before,
                    after.clone(),
                    Some(diff),
                    None,
                    None,
                )?;
            }
            DocumentKind::ConceptGraph => {
                let old = previous_graph.unwrap_or_default();
                let new = &self.concept_graph;
                let counts = json!({
                    "nodes": new.node_count(),
                    "edges": new.edge_count(),
                });
                let meta = json!({
                    "nodesBefore": old.node_count(),
                    "nodesAfter": new.node_count(),
                    "edgesBefore": old.edge_count(),
                    "edgesAfter": new.edge_count(),
                });
                let changed = changed_concepts(&old, new);
                self.journal.log_document_update(
                    kind,
                    actor,
                    note,
                    before,
                    counts,
                    None,
                    Some(changed),
                    Some(meta),
                )?;
            }
        }

        Ok(SaveOutcome {
            document: kind,
            committed: after,
            mirror,
        })
    }

    // ── Synchronization ──

    /// Flush Session, Project and ConceptGraph (in that order) to durable
    /// storage and the mirror, bracketed by sync start/complete entries.
    /// Changes no value.
    pub async fn sync_all(&mut self, actor: Actor) -> Result<SyncReport, StorageError> {
        self.journal.log_sync_start(actor, None)?;
        info!(actor = actor.as_str(), "Memory sync started");

        let mut documents = Vec::with_capacity(DocumentKind::SYNC_ORDER.len());
        for kind in DocumentKind::SYNC_ORDER {
            let value = self.snapshot(kind)?;
            self.durable.write(kind.storage_name(), &value).await?;
            let mirror = self.mirror_document(kind, &value).await;
            documents.push(DocumentMirror {
                document: kind,
                mirror,
            });
        }

        let synced_at = Utc::now();
        self.journal.log_sync_complete(
            actor,
            json!({
                "syncedAt": synced_at,
                "documents": documents,
            }),
        )?;
        info!(
            mirrored = documents.iter().filter(|d| d.mirror.is_mirrored()).count(),
            "Memory sync complete"
        );

        Ok(SyncReport {
            synced_at,
            documents,
        })
    }

    /// Replace all three documents with empty ones. One `memory:reset` entry
    /// records the prior documents.
    pub async fn reset(&mut self, actor: Actor) -> Result<Vec<DocumentMirror>, StorageError> {
        let before = json!({
            "session": self.snapshot(DocumentKind::Session)?,
            "project": self.snapshot(DocumentKind::Project)?,
            "conceptGraph": self.snapshot(DocumentKind::ConceptGraph)?,
        });

        let empty = |kind: DocumentKind| -> Result<Value, StorageError> {
            let encoded = match kind {
                DocumentKind::Session => serde_json::to_value(SessionMemory::default()),
                DocumentKind::Project => serde_json::to_value(ProjectMemory::default()),
                DocumentKind::ConceptGraph => serde_json::to_value(ConceptGraph::default()),
            };
            encoded.map_err(|e| StorageError::Encode {
                name: kind.storage_name().into(),
                reason: e.to_string(),
            })
        };

        let mut values = Vec::with_capacity(DocumentKind::SYNC_ORDER.len());
        for kind in DocumentKind::SYNC_ORDER {
            let value = empty(kind)?;
            self.durable.write(kind.storage_name(), &value).await?;
            values.push((kind, value));
        }

        self.session = SessionMemory::default();
        self.project = ProjectMemory::default();
        self.concept_graph = ConceptGraph::default();

        let mut documents = Vec::with_capacity(values.len());
        for (kind, value) in &values {
            documents.push(DocumentMirror {
                document: *kind,
                mirror: self.mirror_document(*kind, value).await,
            });
        }

        self.journal
            .log_reset(actor, before, json!({ "documents": documents }))?;
        warn!(actor = actor.as_str(), "Memory reset");
        Ok(documents)
    }

    // ── Mirror ──

    /// Upload the in-process value of one document to the mirror.
    pub async fn mirror_now(&self, kind: DocumentKind) -> Result<MirrorOutcome, StorageError> {
        let value = self.snapshot(kind)?;
        Ok(self.mirror_document(kind, &value).await)
    }

    /// The mirrored copy of a document. `Ok(None)` when absent or the mirror
    /// is disabled.
    pub async fn mirrored_copy(&self, kind: DocumentKind) -> Result<Option<Value>, StorageError> {
        match &self.mirror {
            Some(mirror) => {
                mirror
                    .download(self.buckets.for_kind(kind), kind.storage_name())
                    .await
            }
            None => Ok(None),
        }
    }

    async fn mirror_document(&self, kind: DocumentKind, value: &Value) -> MirrorOutcome {
        let Some(mirror) = &self.mirror else {
            return MirrorOutcome::Disabled;
        };
        let bucket = self.buckets.for_kind(kind);
        match mirror.upload(bucket, kind.storage_name(), value).await {
            Ok(receipt) => MirrorOutcome::Mirrored { receipt },
            Err(e) => {
                warn!(document = %kind, bucket, error = %e, "Mirror upload failed");
                MirrorOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn install(&mut self, staged: Staged) {
        match staged {
            Staged::Session(doc) => self.session = doc,
            Staged::Project(doc) => self.project = doc,
            Staged::ConceptGraph(doc) => self.concept_graph = doc,
        }
    }
}

fn decode(kind: DocumentKind, value: Value) -> Result<Staged, StorageError> {
    let err = |e: serde_json::Error| StorageError::Encode {
        name: kind.storage_name().into(),
        reason: e.to_string(),
    };
    Ok(match kind {
        DocumentKind::Session => Staged::Session(serde_json::from_value(value).map_err(err)?),
        DocumentKind::Project => Staged::Project(serde_json::from_value(value).map_err(err)?),
        DocumentKind::ConceptGraph => {
            Staged::ConceptGraph(serde_json::from_value(value).map_err(err)?)
        }
    })
}

/// Session as recorded in the journal: `lastPipeline` reduced to its persona.
/// Applied to both `before` and `after` so consecutive entries chain.
fn session_summary(session: &Value) -> Value {
    let mut summary = session.as_object().cloned().unwrap_or_default();
    if let Some(pipeline) = summary.get(SessionMemory::LAST_PIPELINE) {
        let persona = pipeline.get("personaId").cloned().unwrap_or(Value::Null);
        summary.insert(
            SessionMemory::LAST_PIPELINE.into(),
            json!({ "personaId": persona }),
        );
    }
    Value::Object(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryDocumentStore;
    use crate::journal::{InMemoryJournalSink, JournalSink};
    use crate::mirror::InMemoryMirror;
    use iqraa_core::journal::{EventType, Scope};

    struct Harness {
        durable: Arc<InMemoryDocumentStore>,
        mirror: Arc<InMemoryMirror>,
        sink: Arc<InMemoryJournalSink>,
        store: MemoryStore,
    }

    fn harness() -> Harness {
        let durable = Arc::new(InMemoryDocumentStore::new());
        let mirror = Arc::new(InMemoryMirror::new());
        let sink = Arc::new(InMemoryJournalSink::new());
        let journal = Arc::new(ChangeJournal::new(sink.clone()));
        let store = MemoryStore::new(durable.clone(), journal)
            .with_mirror(mirror.clone(), MirrorBuckets::default());
        Harness {
            durable,
            mirror,
            sink,
            store,
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn graph(ids: &[&str]) -> ConceptGraph {
        ConceptGraph {
            nodes: ids.iter().map(|id| (id.to_string(), json!({"label": id}))).collect(),
            ..ConceptGraph::default()
        }
    }

    #[tokio::test]
    async fn one_journal_entry_per_save_in_call_order() {
        let mut h = harness();
        h.store
            .save_session(record(json!({"lastInput": "a"})), Actor::Pipeline, None)
            .await
            .unwrap();
        h.store
            .save_project(record(json!({"x": 1})), Actor::Pipeline, None)
            .await
            .unwrap();
        h.store
            .save_concept_graph(graph(&["a"]), Actor::Pipeline, None)
            .await
            .unwrap();

        let events = h.store.journal().read_events().unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::SessionUpdate,
                EventType::ProjectUpdate,
                EventType::ConceptGraphUpdate
            ]
        );
    }

    #[tokio::test]
    async fn before_is_prior_in_process_value() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"x": 1, "y": 2})), Actor::System, None)
            .await
            .unwrap();
        h.store
            .save_project(record(json!({"y": 3, "z": 4})), Actor::Pipeline, None)
            .await
            .unwrap();

        let events = h.store.journal().read_events().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.before, Some(json!({"x": 1, "y": 2})));
        assert_eq!(last.after, Some(json!({"x": 1, "y": 3, "z": 4})));
        let diff = last.diff.clone().unwrap();
        assert_eq!(diff.added_keys, vec!["z"]);
        assert_eq!(diff.updated_keys, vec!["y"]);
        assert!(diff.removed_keys.is_empty());
    }

    #[tokio::test]
    async fn project_save_is_shallow_merge() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"keep": true, "nested": {"a": 1}})), Actor::System, None)
            .await
            .unwrap();
        let outcome = h
            .store
            .save_project(record(json!({"nested": {"b": 2}})), Actor::System, None)
            .await
            .unwrap();
        assert_eq!(outcome.committed, json!({"keep": true, "nested": {"b": 2}}));
        assert_eq!(h.store.project().record().len(), 2);
    }

    #[tokio::test]
    async fn concept_graph_save_replaces_and_reports_changed_concepts() {
        let mut h = harness();
        h.store
            .save_concept_graph(graph(&["a", "b"]), Actor::Pipeline, None)
            .await
            .unwrap();
        h.store
            .save_concept_graph(graph(&["b", "c"]), Actor::Pipeline, None)
            .await
            .unwrap();

        assert_eq!(
            h.store.concept_graph().nodes.keys().collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        let events = h.store.journal().read_events().unwrap();
        let last = events.last().unwrap();
        assert_eq!(
            last.changed_concepts,
            Some(vec!["a".to_string(), "c".to_string()])
        );
        assert_eq!(last.after, Some(json!({"nodes": 2, "edges": 0})));
        assert_eq!(last.meta.as_ref().unwrap()["nodesBefore"], 2);
    }

    #[tokio::test]
    async fn session_journal_summarizes_last_pipeline() {
        let mut h = harness();
        h.store
            .save_session(
                record(json!({
                    "lastPipeline": {"personaId": "media-architect", "insight": {"title": "big"}}
                })),
                Actor::Pipeline,
                None,
            )
            .await
            .unwrap();

        let entry = h.store.journal().read_events().unwrap().pop().unwrap();
        assert_eq!(
            entry.after,
            Some(json!({"lastPipeline": {"personaId": "media-architect"}}))
        );
        // In-process state keeps the full pipeline record
        assert!(h.store.session().last_pipeline().unwrap().get("insight").is_some());
    }

    #[tokio::test]
    async fn session_entries_chain_before_to_previous_after() {
        let mut h = harness();
        for (input, persona) in [("first", "media-architect"), ("second", "policy-strategist")] {
            h.store
                .save_session(
                    record(json!({
                        "lastInput": input,
                        "lastPipeline": {"personaId": persona, "insight": {"title": input}}
                    })),
                    Actor::Pipeline,
                    None,
                )
                .await
                .unwrap();
        }

        let events = h.store.journal().read_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].before, events[0].after);
        assert_eq!(
            events[1].before,
            Some(json!({
                "lastInput": "first",
                "lastPipeline": {"personaId": "media-architect"}
            }))
        );
    }

    #[tokio::test]
    async fn mirror_failure_is_not_fatal() {
        let mut h = harness();
        h.mirror.set_fail_uploads(true);
        let outcome = h
            .store
            .save_project(record(json!({"x": 1})), Actor::System, None)
            .await
            .unwrap();
        assert!(matches!(outcome.mirror, MirrorOutcome::Failed { .. }));
        assert_eq!(h.durable.get("project").await, Some(json!({"x": 1})));
        assert_eq!(h.sink.read_lines().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn durable_write_failure_leaves_state_unchanged() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"x": 1})), Actor::System, None)
            .await
            .unwrap();
        h.durable.set_fail_writes(true);

        let err = h
            .store
            .save_project(record(json!({"x": 2})), Actor::System, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert_eq!(h.store.project().record()["x"], json!(1));
        // No journal entry for the failed save
        assert_eq!(h.sink.read_lines().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn journal_failure_propagates() {
        let mut h = harness();
        h.sink.set_fail_appends(true);
        let err = h
            .store
            .save_session(record(json!({"a": 1})), Actor::System, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Append(_)));
    }

    #[tokio::test]
    async fn sync_all_flushes_in_order_with_bracket() {
        let mut h = harness();
        let report = h.store.sync_all(Actor::Pipeline).await.unwrap();

        assert_eq!(
            h.durable.write_log().await,
            vec!["session", "project", "concept-graph"]
        );
        assert_eq!(h.durable.get("session").await, Some(json!({})));
        assert_eq!(
            h.durable.get("concept-graph").await,
            Some(json!({"nodes": {}, "edges": []}))
        );
        assert_eq!(report.documents.len(), 3);
        assert!(report.documents.iter().all(|d| d.mirror.is_mirrored()));

        let events = h.store.journal().read_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::SyncStart);
        assert_eq!(events[1].event_type, EventType::SyncComplete);
        assert!(events[1].meta.as_ref().unwrap().get("syncedAt").is_some());
    }

    #[tokio::test]
    async fn sync_uses_configured_buckets() {
        let mut h = harness();
        h.store.sync_all(Actor::System).await.unwrap();
        let uploads = h.mirror.upload_log().await;
        assert_eq!(
            uploads,
            vec![
                ("iqraa-dashboard-memory".to_string(), "session".to_string()),
                ("iqraa-dashboard-memory".to_string(), "project".to_string()),
                ("concept-graph-memory".to_string(), "concept-graph".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn consecutive_syncs_are_idempotent() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"runsCount": 3})), Actor::System, None)
            .await
            .unwrap();
        h.store.sync_all(Actor::System).await.unwrap();
        let first = h.durable.get("project").await;
        h.store.sync_all(Actor::System).await.unwrap();
        assert_eq!(h.durable.get("project").await, first);

        let events = h.store.journal().read_events().unwrap();
        let starts = events.iter().filter(|e| e.event_type == EventType::SyncStart).count();
        let completes = events
            .iter()
            .filter(|e| e.event_type == EventType::SyncComplete)
            .count();
        assert_eq!((starts, completes), (2, 2));
    }

    #[tokio::test]
    async fn sync_without_mirror_reports_disabled() {
        let durable = Arc::new(InMemoryDocumentStore::new());
        let journal = Arc::new(ChangeJournal::new(Arc::new(InMemoryJournalSink::new())));
        let mut store = MemoryStore::new(durable, journal);
        let report = store.sync_all(Actor::System).await.unwrap();
        assert!(report
            .documents
            .iter()
            .all(|d| d.mirror == MirrorOutcome::Disabled));
        assert!(store.mirrored_copy(DocumentKind::Project).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_reads_durable_documents() {
        let mut h = harness();
        h.durable.insert("project", json!({"currentTopic": "ethics"})).await;
        h.store.load_all().await.unwrap();
        assert_eq!(h.store.project().current_topic(), Some("ethics"));
        assert!(h.store.journal().read_events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_missing_document_keeps_in_process_value() {
        let mut h = harness();
        h.store
            .save_session(record(json!({"lastInput": "kept"})), Actor::System, None)
            .await
            .unwrap();
        // Remove the durable copy by using a fresh durable store
        let journal = h.store.journal().clone();
        let mut store = MemoryStore::new(Arc::new(InMemoryDocumentStore::new()), journal);
        store.session = h.store.session().clone();
        store.load(DocumentKind::Session).await.unwrap();
        assert_eq!(store.session().last_input(), Some("kept"));
    }

    #[tokio::test]
    async fn corrupted_document_logs_memory_error() {
        let mut h = harness();
        h.durable.insert("concept-graph", json!({"nodes": [1, 2, 3]})).await;
        h.store.load(DocumentKind::ConceptGraph).await.unwrap();

        assert_eq!(h.store.concept_graph(), &ConceptGraph::default());
        let events = h.store.journal().read_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Error);
        assert_eq!(events[0].scope, Scope::ConceptGraph);
    }

    #[tokio::test]
    async fn reset_clears_documents_with_single_entry() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"runsCount": 4})), Actor::Pipeline, None)
            .await
            .unwrap();
        h.store
            .save_concept_graph(graph(&["a"]), Actor::Pipeline, None)
            .await
            .unwrap();

        let documents = h.store.reset(Actor::Admin).await.unwrap();
        assert_eq!(documents.len(), 3);
        assert!(h.store.project().record().is_empty());
        assert_eq!(h.store.concept_graph().node_count(), 0);
        assert_eq!(h.durable.get("project").await, Some(json!({})));

        let events = h.store.journal().read_events().unwrap();
        let reset = events.last().unwrap();
        assert_eq!(reset.event_type, EventType::Reset);
        assert_eq!(reset.actor, Actor::Admin);
        assert_eq!(reset.before.as_ref().unwrap()["project"]["runsCount"], 4);
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn mirrored_copy_matches_last_upload() {
        let mut h = harness();
        h.store
            .save_project(record(json!({"x": 9})), Actor::System, None)
            .await
            .unwrap();
        let copy = h.store.mirrored_copy(DocumentKind::Project).await.unwrap();
        assert_eq!(copy, Some(json!({"x": 9})));
    }
}
