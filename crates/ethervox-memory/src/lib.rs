//! Conversation memory store for EthervoxAI.
//!
//! An ordered, tagged, importance-scored log of turns with an append-only
//! JSONL backing file and a tag-inverted index. Implements
//! [`ethervox_registry::CorrectionsSource`] so the tool registry can draw
//! recent corrections and successful patterns into its system prompt.

pub mod entry;
pub mod error;
pub mod export;
pub mod log;
pub mod store;

pub use entry::{MemoryEntry, MAX_TAGS, MAX_TAG_BYTES, MAX_TEXT_BYTES, MAX_TOOLS_CALLED};
pub use error::{MemoryError, Result};
pub use export::ExportFormat;
pub use store::{Counters, MemoryStore, SearchResult};
