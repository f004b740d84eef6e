//! Error types for the conversation memory store.

/// Errors the memory store can raise. Never produced during normal,
/// well-formed use — these correspond to the failure modes named in
/// spec.md §4.3 and §7.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// `init` was called on a store that is already initialized.
    #[error("already-initialized")]
    AlreadyInitialized,

    /// An operation requiring persistence was called before `init`.
    #[error("store is not initialized")]
    NotInitialized,

    /// Referenced a `memory_id` that does not exist.
    #[error("no such memory entry: {0}")]
    NotFound(u64),

    /// Underlying filesystem error (append log, export/import, archiving).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON during export/import or log replay.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Caller-supplied argument was invalid (e.g. unknown export format).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
