//! Error types for the chat-template catalog.

/// Errors surfaced by [`crate::catalog`] and [`crate::format`].
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A format helper would have written more bytes than the caller's
    /// buffer can hold.
    #[error("buffer too small: needed {needed} bytes, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, TemplateError>;
