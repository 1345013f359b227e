//! Change journal entries: the append-only audit record of memory mutations.
//!
//! One entry is written per document save, two per full synchronization
//! (start and complete), one per reset, and one per load error. Entries are
//! serialized as one JSON object per line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "session:update")]
    SessionUpdate,
    #[serde(rename = "project:update")]
    ProjectUpdate,
    #[serde(rename = "conceptGraph:update")]
    ConceptGraphUpdate,
    #[serde(rename = "memory:sync:start")]
    SyncStart,
    #[serde(rename = "memory:sync:complete")]
    SyncComplete,
    #[serde(rename = "memory:reset")]
    Reset,
    #[serde(rename = "memory:error")]
    Error,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::SessionUpdate => "session:update",
            EventType::ProjectUpdate => "project:update",
            EventType::ConceptGraphUpdate => "conceptGraph:update",
            EventType::SyncStart => "memory:sync:start",
            EventType::SyncComplete => "memory:sync:complete",
            EventType::Reset => "memory:reset",
            EventType::Error => "memory:error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of memory an entry concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    Session,
    Project,
    ConceptGraph,
    Sync,
    System,
}

/// Who caused the mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    #[default]
    System,
    User,
    Pipeline,
    Admin,
}

impl Actor {
    pub fn as_str(self) -> &'static str {
        match self {
            Actor::System => "system",
            Actor::User => "user",
            Actor::Pipeline => "pipeline",
            Actor::Admin => "admin",
        }
    }
}

/// Top-level key changes between two records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDiff {
    #[serde(default)]
    pub added_keys: Vec<String>,
    #[serde(default)]
    pub updated_keys: Vec<String>,
    #[serde(default)]
    pub removed_keys: Vec<String>,
}

impl KeyDiff {
    pub fn is_empty(&self) -> bool {
        self.added_keys.is_empty() && self.updated_keys.is_empty() && self.removed_keys.is_empty()
    }
}

/// A single journal record.
///
/// `timestamp` is optional on construction; the journal assigns one at
/// append time when it is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: EventType,
    pub scope: Scope,
    pub actor: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<KeyDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_concepts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl JournalEntry {
    pub fn new(event_type: EventType, scope: Scope, actor: Actor) -> Self {
        Self {
            timestamp: None,
            event_type,
            scope,
            actor,
            note: None,
            before: None,
            after: None,
            diff: None,
            changed_concepts: None,
            meta: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }

    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }

    pub fn with_diff(mut self, diff: KeyDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_changed_concepts(mut self, concepts: Vec<String>) -> Self {
        self.changed_concepts = Some(concepts);
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_types_use_colon_names() {
        let json = serde_json::to_string(&EventType::SyncComplete).unwrap();
        assert_eq!(json, "\"memory:sync:complete\"");
        let parsed: EventType = serde_json::from_str("\"conceptGraph:update\"").unwrap();
        assert_eq!(parsed, EventType::ConceptGraphUpdate);
    }

    #[test]
    fn entry_omits_absent_fields() {
        let entry = JournalEntry::new(EventType::Reset, Scope::System, Actor::Admin)
            .with_note("manual reset");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["eventType"], "memory:reset");
        assert_eq!(json["scope"], "system");
        assert_eq!(json["actor"], "admin");
        assert!(json.get("before").is_none());
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn entry_roundtrips_with_diff() {
        let entry = JournalEntry::new(EventType::ProjectUpdate, Scope::Project, Actor::Pipeline)
            .with_diff(KeyDiff {
                added_keys: vec!["z".into()],
                updated_keys: vec!["y".into()],
                removed_keys: vec![],
            })
            .with_after(json!({"y": 3, "z": 4}))
            .with_timestamp(Utc::now());
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains("addedKeys"));
        let back: JournalEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn scope_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&Scope::ConceptGraph).unwrap(), "\"conceptGraph\"");
    }
}
