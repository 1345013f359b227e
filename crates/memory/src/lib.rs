//! Memory system for Iqraa: the versioned document store, its change
//! journal, and the storage backends behind them.

pub mod diff;
pub mod file_store;
pub mod in_memory;
pub mod journal;
pub mod mirror;
pub mod reader;
pub mod store;

pub use diff::{changed_concepts, key_diff, value_key_diff};
pub use file_store::FileDocumentStore;
pub use in_memory::InMemoryDocumentStore;
pub use journal::{ChangeJournal, FileJournalSink, InMemoryJournalSink, JournalSink};
pub use mirror::{FileMirror, InMemoryMirror};
pub use reader::{JournalOverview, DEFAULT_LAST_EVENTS};
pub use store::{DocumentMirror, MemoryStore, MirrorBuckets, MirrorOutcome, SaveOutcome, SyncReport};

use iqraa_config::MemoryConfig;
use std::sync::Arc;

/// Build a file-backed store (plus journal and optional file mirror) from
/// configuration. Documents are not loaded yet; call
/// [`MemoryStore::load_all`] before use.
pub fn build_from_config(config: &MemoryConfig) -> MemoryStore {
    let durable = Arc::new(FileDocumentStore::new(&config.dir));
    let journal = Arc::new(ChangeJournal::file(config.journal_path()));
    let store = MemoryStore::new(durable, journal);

    if config.mirror.enabled {
        let buckets = MirrorBuckets {
            main: config.mirror.main_bucket.clone(),
            concept: config.mirror.concept_bucket.clone(),
        };
        store.with_mirror(Arc::new(FileMirror::new(config.mirror_dir())), buckets)
    } else {
        store
    }
}
