//! Remote mirror implementations.
//!
//! The file mirror lays buckets out flat: `<root>/<bucket>__<filename>.json`.
//! The in-memory mirror is for tests and can be told to fail uploads.

use async_trait::async_trait;
use iqraa_core::error::StorageError;
use iqraa_core::memory::{MirrorReceipt, RemoteMirror};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A directory standing in for an object store.
pub struct FileMirror {
    root: PathBuf,
}

impl FileMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, filename: &str) -> PathBuf {
        self.root.join(format!("{bucket}__{filename}.json"))
    }
}

#[async_trait]
impl RemoteMirror for FileMirror {
    fn name(&self) -> &str {
        "file"
    }

    async fn upload(
        &self,
        bucket: &str,
        filename: &str,
        value: &Value,
    ) -> Result<MirrorReceipt, StorageError> {
        let mirror_err = |reason: String| StorageError::Mirror {
            bucket: bucket.into(),
            filename: filename.into(),
            reason,
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| mirror_err(e.to_string()))?;

        let body = serde_json::to_string_pretty(value).map_err(|e| mirror_err(e.to_string()))?;
        let path = self.object_path(bucket, filename);
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|e| mirror_err(e.to_string()))?;

        Ok(MirrorReceipt {
            bucket: bucket.into(),
            filename: filename.into(),
            location: path.display().to_string(),
        })
    }

    async fn download(&self, bucket: &str, filename: &str) -> Result<Option<Value>, StorageError> {
        let path = self.object_path(bucket, filename);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Mirror {
                    bucket: bucket.into(),
                    filename: filename.into(),
                    reason: e.to_string(),
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Mirror {
                bucket: bucket.into(),
                filename: filename.into(),
                reason: format!("invalid JSON: {e}"),
            })
    }
}

/// Mirror backed by a map, keyed by `(bucket, filename)`.
#[derive(Default)]
pub struct InMemoryMirror {
    objects: RwLock<BTreeMap<(String, String), Value>>,
    uploads: RwLock<Vec<(String, String)>>,
    fail_uploads: AtomicBool,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// `(bucket, filename)` of every successful upload, in order.
    pub async fn upload_log(&self) -> Vec<(String, String)> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl RemoteMirror for InMemoryMirror {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upload(
        &self,
        bucket: &str,
        filename: &str,
        value: &Value,
    ) -> Result<MirrorReceipt, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Mirror {
                bucket: bucket.into(),
                filename: filename.into(),
                reason: "mirror unreachable".into(),
            });
        }
        let key = (bucket.to_string(), filename.to_string());
        self.objects.write().await.insert(key.clone(), value.clone());
        self.uploads.write().await.push(key);
        Ok(MirrorReceipt {
            bucket: bucket.into(),
            filename: filename.into(),
            location: format!("memory://{bucket}/{filename}"),
        })
    }

    async fn download(&self, bucket: &str, filename: &str) -> Result<Option<Value>, StorageError> {
        let key = (bucket.to_string(), filename.to_string());
        Ok(self.objects.read().await.get(&key).cloned())
    }
}
