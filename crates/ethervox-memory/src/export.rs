//! JSON and Markdown export, and JSON import (spec.md §4.3, §6).

use serde::{Deserialize, Serialize};

use crate::entry::MemoryEntry;
use crate::error::Result;
use crate::store::Counters;

/// The two export formats `MemoryStore::export` supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::error::MemoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "markdown" => Ok(Self::Markdown),
            other => Err(crate::error::MemoryError::InvalidArgument(format!(
                "unknown export format: {other}"
            ))),
        }
    }
}

/// The shape of a JSON export, per spec.md §6: a single object containing
/// the session id, start time, counters, and every entry.
#[derive(Debug, Serialize, Deserialize)]
struct ExportDocument {
    session_id: String,
    session_started_epoch: i64,
    counters: Counters,
    entries: Vec<MemoryEntry>,
}

pub fn to_json(
    session_id: &str,
    session_started: i64,
    counters: &Counters,
    entries: &[MemoryEntry],
) -> Result<Vec<u8>> {
    let doc = ExportDocument {
        session_id: session_id.to_string(),
        session_started_epoch: session_started,
        counters: counters.clone(),
        entries: entries.to_vec(),
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}

pub fn from_json(bytes: &[u8]) -> Result<Vec<MemoryEntry>> {
    let doc: ExportDocument = serde_json::from_slice(bytes)?;
    Ok(doc.entries)
}

pub fn to_markdown(session_id: &str, session_started: i64, entries: &[MemoryEntry]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("# Session `{session_id}`\n\n"));
    out.push_str(&format!("Started: epoch {session_started}\n\n"));

    for entry in entries {
        out.push_str(&format!(
            "## Turn {} — {}\n\n",
            entry.turn_id,
            if entry.is_user_message { "user" } else { "assistant" }
        ));
        out.push_str(&format!("{}\n\n", entry.text));
        if !entry.tags.is_empty() {
            out.push_str(&format!("Tags: {}\n\n", entry.tags.join(", ")));
        }
        out.push_str(&format!("Importance: {:.2}\n\n", entry.importance));
        if !entry.tools_called.is_empty() {
            out.push_str(&format!("Tools called: {}\n\n", entry.tools_called.join(", ")));
        }
        out.push_str("---\n\n");
    }

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<MemoryEntry> {
        vec![MemoryEntry {
            id: 1,
            turn_id: 1,
            timestamp: 1000,
            text: "hello".to_string(),
            tags: vec!["greeting".to_string()],
            importance: 0.5,
            is_user_message: true,
            tools_called: vec![],
        }]
    }

    #[test]
    fn json_round_trips_entries() {
        let entries = sample_entries();
        let counters = Counters { stored: 1, total_searches: 0, total_exports: 0 };
        let bytes = to_json("s1", 999, &counters, &entries).unwrap();
        let loaded = from_json(&bytes).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn markdown_contains_turn_headings_and_text() {
        let entries = sample_entries();
        let bytes = to_markdown("s1", 999, &entries);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("## Turn 1"));
        assert!(text.contains("hello"));
    }

    #[test]
    fn format_from_str_rejects_unknown() {
        use std::str::FromStr;
        assert!(ExportFormat::from_str("xml").is_err());
        assert_eq!(ExportFormat::from_str("json").unwrap(), ExportFormat::Json);
    }
}
