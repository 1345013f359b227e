//! # Iqraa Core
//!
//! Domain types, traits, and error definitions for the Iqraa staged
//! processing pipeline. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait defined here:
//! - [`TextGenerator`] for the opaque generation capability
//! - [`DocumentStore`] for durable named JSON documents
//! - [`RemoteMirror`] for the best-effort secondary copy
//!
//! Implementations live in their respective crates, which keeps the
//! orchestrator testable with scripted generators and in-memory storage.

pub mod error;
pub mod generation;
pub mod journal;
pub mod memory;
pub mod persona;
pub mod stage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, PipelineError, Result, StorageError};
pub use generation::{GenerationRequest, GenerationResponse, TextGenerator};
pub use journal::{Actor, EventType, JournalEntry, KeyDiff, Scope};
pub use memory::{
    ConceptGraph, DocumentKind, DocumentStore, MergeStrategy, MirrorReceipt,
    ProjectMemory, Record, RemoteMirror, SessionMemory,
};
pub use persona::{
    CognitiveWeights, ExpansionDepth, Focus, MemoryMode, Persona, PreferredLength, Tone,
};
pub use stage::{Stage, StageId, StageKind};
