//! The memory entry type and the ingress clamping/truncation rules that
//! apply to every field on the way in (spec.md §3, testable property 3).

use serde::{Deserialize, Serialize};

/// Entries longer than this are truncated (spec.md §3: "text (≤8192 bytes)").
pub const MAX_TEXT_BYTES: usize = 8192;
/// At most this many tags per entry.
pub const MAX_TAGS: usize = 16;
/// Each tag is truncated to this many bytes.
pub const MAX_TAG_BYTES: usize = 63;
/// At most this many tool names recorded per entry.
pub const MAX_TOOLS_CALLED: usize = 16;

/// A single entry in the memory store's ordered log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    pub id: u64,
    pub turn_id: u64,
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub text: String,
    pub tags: Vec<String>,
    pub importance: f64,
    pub is_user_message: bool,
    pub tools_called: Vec<String>,
}

/// Clamp `importance` into `[0, 1]`; values outside saturate at the nearer
/// bound (testable property 3).
pub fn clamp_importance(importance: f64) -> f64 {
    if importance.is_nan() {
        0.0
    } else {
        importance.clamp(0.0, 1.0)
    }
}

/// Truncate `text` to [`MAX_TEXT_BYTES`] bytes on a UTF-8 boundary.
pub fn truncate_text(text: &str) -> String {
    truncate_str(text, MAX_TEXT_BYTES)
}

/// Truncate and cap a tag list to [`MAX_TAGS`] entries of [`MAX_TAG_BYTES`]
/// bytes each.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .take(MAX_TAGS)
        .map(|t| truncate_str(t, MAX_TAG_BYTES))
        .collect()
}

/// Truncate and cap a tool-name list to [`MAX_TOOLS_CALLED`] entries.
pub fn normalize_tools_called(tools: &[String]) -> Vec<String> {
    tools.iter().take(MAX_TOOLS_CALLED).cloned().collect()
}

fn truncate_str(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
