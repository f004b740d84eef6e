//! Tool catalog and system-prompt synthesis for EthervoxAI.
//!
//! [`ToolRegistry`] is the append-only catalog the Governor dispatches
//! through. It also synthesizes the system prompt that teaches the model the
//! `<tool_call ... />` micro-format.

pub mod error;
pub mod registry;
pub mod tool;

pub use error::{RegistryError, Result};
pub use registry::{CorrectionsSource, PlatformMode, PromptMemoryHint, ToolRegistry};
pub use tool::{DispatchFn, DispatchResult, ToolDefinition};
