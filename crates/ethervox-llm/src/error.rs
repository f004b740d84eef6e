//! Error types for the LLM backend boundary.

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("tokenize failed: {0}")]
    TokenizeFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("context window exceeded: requested position {requested}, capacity {capacity}")]
    ContextExceeded { requested: u32, capacity: u32 },

    #[error("internal backend error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
