//! Error types for the Iqraa domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Iqraa operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Storage errors (durable documents, journal, mirror) ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Pipeline errors ---
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the durable collaborators: local documents, the journal file,
/// and the remote mirror.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to read document '{name}': {reason}")]
    Read { name: String, reason: String },

    #[error("Failed to write document '{name}': {reason}")]
    Write { name: String, reason: String },

    #[error("Journal append failed: {0}")]
    Append(String),

    #[error("Mirror transfer failed for {bucket}/{filename}: {reason}")]
    Mirror {
        bucket: String,
        filename: String,
        reason: String,
    },

    #[error("Failed to encode document '{name}': {reason}")]
    Encode { name: String, reason: String },
}

/// Failures of the external text-generation capability.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Raised only by explicit persona selection; runs fall back to the default.
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Memory persistence failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode stage output: {0}")]
    Serialization(#[from] serde_json::Error),
}
