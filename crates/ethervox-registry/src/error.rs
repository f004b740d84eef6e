//! Error types for the tool registry.

/// Errors surfaced by [`crate::registry::ToolRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),

    /// Growing the registry's backing storage failed.
    #[error("allocation failed while registering tool `{0}`")]
    AllocationFailed(String),

    /// A format helper would have overflowed the caller's buffer.
    #[error("buffer too small: needed {needed} bytes, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
