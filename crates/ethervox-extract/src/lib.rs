//! Tool-call extraction and argument building for EthervoxAI.
//!
//! Scans model-generated text for `<tool_call ... />` occurrences, builds
//! each call's JSON argument payload, and dispatches through the
//! [`ethervox_registry::ToolRegistry`].

pub mod build;
pub mod error;
pub mod extractor;
pub mod scan;

pub use build::{ToolCallArgBuilder, RECOGNIZED_ARG_KEYS};
pub use error::ExtractError;
pub use extractor::{extract_and_dispatch, ExtractionBatch, ToolCallOutcome};
pub use scan::{parse_attrs, scan_tool_calls, RawToolCall};
