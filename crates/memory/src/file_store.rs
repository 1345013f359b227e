//! File-based document store: one pretty-printed JSON file per document.
//!
//! Storage location: `<dir>/<name>.json`, e.g. `~/.iqraa/memory/session.json`.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write never leaves a half-written document behind.

use async_trait::async_trait;
use iqraa_core::error::StorageError;
use iqraa_core::memory::DocumentStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileDocumentStore {
    dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn read(&self, name: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(name);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Read {
                    name: name.into(),
                    reason: e.to_string(),
                });
            }
        };

        let value = serde_json::from_str(&content).map_err(|e| StorageError::Read {
            name: name.into(),
            reason: format!("invalid JSON: {e}"),
        })?;
        Ok(Some(value))
    }

    async fn write(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        let write_err = |reason: String| StorageError::Write {
            name: name.into(),
            reason,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_err(format!("Failed to create memory directory: {e}")))?;

        let mut content = serde_json::to_string_pretty(value).map_err(|e| StorageError::Encode {
            name: name.into(),
            reason: e.to_string(),
        })?;
        content.push('\n');

        let path = self.path_for(name);
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        tokio::fs::write(&tmp, content.as_bytes())
            .await
            .map_err(|e| write_err(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_err(e.to_string()))?;

        debug!(document = name, path = %path.display(), "Document written");
        Ok(())
    }
}
