//! Error types for tool-call extraction.

/// Per-call extraction failure. These are never fatal to the batch — the
/// Governor injects them back into the conversation as `<tool_error>`.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The `<tool_call ...>` occurrence had no `name` attribute.
    #[error("tool call missing required `name` attribute")]
    MissingName,

    /// `name` did not match any tool in the registry.
    #[error("unknown-tool: {0}")]
    UnknownTool(String),

    /// The tool's dispatch function returned an error string.
    #[error("tool-dispatch-failed: {0}")]
    DispatchFailed(String),
}
