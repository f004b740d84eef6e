//! Governor error taxonomy.
//!
//! Mirrors the fatal/non-fatal split of spec.md's error table: tokenizer and
//! decode failures here are the only cases that abort `execute` outright —
//! unknown tools and dispatch failures are handled inside the loop and never
//! surface as an `Err`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GovernorError>;

#[derive(Debug, Error)]
pub enum GovernorError {
    // -- Lifecycle errors --
    #[error("governor already initialized")]
    AlreadyInitialized,

    #[error("governor not initialized")]
    NotInitialized,

    #[error("model not loaded")]
    NotLoaded,

    // -- Registry/prompt errors --
    #[error("system prompt synthesis failed: {0}")]
    Registry(#[from] ethervox_registry::RegistryError),

    // -- Inference errors --
    #[error("tokenize failed: {0}")]
    TokenizeFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    // -- Catch-all --
    #[error("internal governor error: {0}")]
    Internal(String),
}
