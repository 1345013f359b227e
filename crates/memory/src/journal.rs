//! Change journal: append-only, newline-delimited JSON audit log.
//!
//! Every entry is stamped (if it has no timestamp yet), serialized to a
//! single line, and handed to a [`JournalSink`]. Appends are serialized
//! through a mutex so concurrent writers never interleave lines. Nothing in
//! this module rewrites or truncates existing lines.

use chrono::Utc;
use iqraa_core::error::StorageError;
use iqraa_core::journal::{Actor, EventType, JournalEntry, KeyDiff, Scope};
use iqraa_core::memory::DocumentKind;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::reader::{self, JournalOverview};

/// Where journal lines end up.
pub trait JournalSink: Send + Sync {
    fn name(&self) -> &str;

    /// Append one line. `line` carries no trailing newline.
    fn append_line(&self, line: &str) -> Result<(), StorageError>;

    /// All lines currently in the log, oldest first.
    fn read_lines(&self) -> Result<Vec<String>, StorageError>;
}

/// Appends to a file, creating it (and its directory) on first use.
pub struct FileJournalSink {
    path: PathBuf,
}

impl FileJournalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalSink for FileJournalSink {
    fn name(&self) -> &str {
        "file"
    }

    fn append_line(&self, line: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Append(format!("Failed to create journal directory: {e}"))
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::Append(format!("{}: {e}", self.path.display())))?;

        writeln!(file, "{line}")
            .map_err(|e| StorageError::Append(format!("{}: {e}", self.path.display())))
    }

    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Read {
                    name: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// Keeps lines in a vector. Useful for testing; can simulate append failures.
#[derive(Default)]
pub struct InMemoryJournalSink {
    lines: Mutex<Vec<String>>,
    fail_appends: std::sync::atomic::AtomicBool,
}

impl InMemoryJournalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Push a raw line, bypassing serialization (for malformed-line tests).
    pub fn push_raw(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    }
}

impl JournalSink for InMemoryJournalSink {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn append_line(&self, line: &str) -> Result<(), StorageError> {
        if self.fail_appends.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Append("simulated append failure".into()));
        }
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }

    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

/// The journal. Never mutates memory; memory never reads from it.
pub struct ChangeJournal {
    sink: Arc<dyn JournalSink>,
    append_lock: Mutex<()>,
}

impl std::fmt::Debug for ChangeJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeJournal")
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl ChangeJournal {
    pub fn new(sink: Arc<dyn JournalSink>) -> Self {
        Self {
            sink,
            append_lock: Mutex::new(()),
        }
    }

    /// Journal appending to `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileJournalSink::new(path)))
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Stamp, serialize and append one entry. Failure is fatal to the caller.
    pub fn append(&self, mut entry: JournalEntry) -> Result<JournalEntry, StorageError> {
        if entry.timestamp.is_none() {
            entry.timestamp = Some(Utc::now());
        }

        let line = serde_json::to_string(&entry).map_err(|e| StorageError::Encode {
            name: "journal entry".into(),
            reason: e.to_string(),
        })?;

        let _guard = self.append_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.sink.append_line(&line)?;
        debug!(event = %entry.event_type, actor = entry.actor.as_str(), "Journal entry appended");
        Ok(entry)
    }

    // ── Convenience constructors ──

    /// One entry for a single document save.
    #[allow(clippy::too_many_arguments)]
    pub fn log_document_update(
        &self,
        kind: DocumentKind,
        actor: Actor,
        note: Option<String>,
        before: Value,
        after: Value,
        diff: Option<KeyDiff>,
        changed_concepts: Option<Vec<String>>,
        meta: Option<Value>,
    ) -> Result<JournalEntry, StorageError> {
        let mut entry = JournalEntry::new(kind.update_event(), kind.scope(), actor)
            .with_before(before)
            .with_after(after);
        entry.note = note;
        entry.diff = diff;
        entry.changed_concepts = changed_concepts;
        entry.meta = meta;
        self.append(entry)
    }

    pub fn log_sync_start(&self, actor: Actor, note: Option<String>) -> Result<JournalEntry, StorageError> {
        let mut entry = JournalEntry::new(EventType::SyncStart, Scope::Sync, actor);
        entry.note = note;
        self.append(entry)
    }

    pub fn log_sync_complete(&self, actor: Actor, meta: Value) -> Result<JournalEntry, StorageError> {
        self.append(JournalEntry::new(EventType::SyncComplete, Scope::Sync, actor).with_meta(meta))
    }

    pub fn log_reset(&self, actor: Actor, before: Value, meta: Value) -> Result<JournalEntry, StorageError> {
        self.append(
            JournalEntry::new(EventType::Reset, Scope::System, actor)
                .with_note("all memory documents reset")
                .with_before(before)
                .with_meta(meta),
        )
    }

    pub fn log_error(
        &self,
        scope: Scope,
        note: impl Into<String>,
        meta: Value,
    ) -> Result<JournalEntry, StorageError> {
        self.append(
            JournalEntry::new(EventType::Error, scope, Actor::System)
                .with_note(note)
                .with_meta(meta),
        )
    }

    // ── Reading ──

    /// Every parseable entry, oldest first. Malformed lines are skipped.
    pub fn read_events(&self) -> Result<Vec<JournalEntry>, StorageError> {
        let lines = self.sink.read_lines()?;
        Ok(lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<JournalEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed journal line");
                    None
                }
            })
            .collect())
    }

    pub fn overview(&self, max_last: usize) -> Result<JournalOverview, StorageError> {
        Ok(reader::summarize(&self.read_events()?, max_last))
    }
}
