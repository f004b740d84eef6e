//! The per-model prompt file schema (spec.md §6's "Per-model prompt file").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolPromptEntry {
    pub name: String,
    pub when: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedPrompts {
    pub model_path: String,
    pub generated_at: i64,
    pub preferences: String,
    pub tools: Vec<ToolPromptEntry>,
}
