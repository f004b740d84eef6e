//! Append-only JSONL event log and its replay semantics (spec.md §4.3,
//! testable property 5).
//!
//! Three record shapes, distinguished by the presence/value of an `op`
//! field: an insert record has none; updates carry `op: "update"` or
//! `op: "update_text"`. Replay applies records in order; update records
//! mutate the most recent occurrence of the referenced id; anything else
//! is skipped with a warning rather than aborting the whole replay.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::entry::MemoryEntry;
use crate::error::Result;

#[derive(Serialize)]
struct InsertRecord<'a> {
    id: u64,
    turn: u64,
    ts: i64,
    user: bool,
    imp: f64,
    text: &'a str,
    tags: &'a [String],
}

#[derive(Serialize)]
struct UpdateTagsRecord<'a> {
    op: &'static str,
    id: u64,
    tags: &'a [String],
}

#[derive(Serialize)]
struct UpdateTextRecord<'a> {
    op: &'static str,
    id: u64,
    text: &'a str,
}

/// Open (creating if absent) the append log at `path` for writing.
pub fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn write_line(file: &mut File, value: &impl Serialize) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    file.flush()?;
    Ok(())
}

pub fn append_insert(file: &mut File, entry: &MemoryEntry) -> Result<()> {
    write_line(
        file,
        &InsertRecord {
            id: entry.id,
            turn: entry.turn_id,
            ts: entry.timestamp,
            user: entry.is_user_message,
            imp: entry.importance,
            text: &entry.text,
            tags: &entry.tags,
        },
    )
}

pub fn append_update_tags(file: &mut File, id: u64, tags: &[String]) -> Result<()> {
    write_line(
        file,
        &UpdateTagsRecord {
            op: "update",
            id,
            tags,
        },
    )
}

pub fn append_update_text(file: &mut File, id: u64, text: &str) -> Result<()> {
    write_line(
        file,
        &UpdateTextRecord {
            op: "update_text",
            id,
            text,
        },
    )
}

/// Replay a log file from scratch, yielding the ordered entries it encodes.
/// Update records mutate the most recent occurrence of their id; unknown
/// shapes are skipped with a `tracing::warn!`.
pub fn replay(path: &Path) -> Result<Vec<MemoryEntry>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries: Vec<MemoryEntry> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping unparseable log line");
                continue;
            }
        };
        apply_record(&mut entries, &value, line_no);
    }

    Ok(entries)
}

fn apply_record(entries: &mut Vec<MemoryEntry>, value: &Value, line_no: usize) {
    match value.get("op").and_then(Value::as_str) {
        None => match parse_insert(value) {
            Some(entry) => entries.push(entry),
            None => tracing::warn!(line = line_no, "skipping malformed insert record"),
        },
        Some("update") => {
            let (Some(id), Some(tags)) = (
                value.get("id").and_then(Value::as_u64),
                value.get("tags").and_then(Value::as_array),
            ) else {
                tracing::warn!(line = line_no, "skipping malformed update record");
                return;
            };
            if let Some(entry) = entries.iter_mut().rev().find(|e| e.id == id) {
                entry.tags = tags
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect();
            } else {
                tracing::warn!(line = line_no, id, "update for unknown id");
            }
        }
        Some("update_text") => {
            let (Some(id), Some(text)) = (
                value.get("id").and_then(Value::as_u64),
                value.get("text").and_then(Value::as_str),
            ) else {
                tracing::warn!(line = line_no, "skipping malformed update_text record");
                return;
            };
            if let Some(entry) = entries.iter_mut().rev().find(|e| e.id == id) {
                entry.text = text.to_string();
            } else {
                tracing::warn!(line = line_no, id, "update_text for unknown id");
            }
        }
        Some(other) => {
            tracing::warn!(line = line_no, op = other, "skipping unknown record shape");
        }
    }
}

fn parse_insert(value: &Value) -> Option<MemoryEntry> {
    Some(MemoryEntry {
        id: value.get("id")?.as_u64()?,
        turn_id: value.get("turn")?.as_u64()?,
        timestamp: value.get("ts")?.as_i64()?,
        is_user_message: value.get("user")?.as_bool()?,
        importance: value.get("imp")?.as_f64()?,
        text: value.get("text")?.as_str()?.to_string(),
        tags: value
            .get("tags")?
            .as_array()?
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect(),
        tools_called: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(id: u64, text: &str, tags: &[&str]) -> MemoryEntry {
        MemoryEntry {
            id,
            turn_id: id,
            timestamp: 1000,
            text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            importance: 0.5,
            is_user_message: true,
            tools_called: Vec::new(),
        }
    }

    #[test]
    fn replay_round_trips_inserts_and_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut file = open_append(&path).unwrap();

        append_insert(&mut file, &entry(1, "hello", &["greeting"])).unwrap();
        append_insert(&mut file, &entry(2, "world", &["noun"])).unwrap();
        append_update_text(&mut file, 1, "hello there").unwrap();
        append_update_tags(&mut file, 2, &["noun".to_string(), "extra".to_string()]).unwrap();

        let replayed = replay(&path).unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].text, "hello there");
        assert_eq!(replayed[1].tags, vec!["noun", "extra"]);
    }

    #[test]
    fn unknown_record_shape_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut file = open_append(&path).unwrap();
        append_insert(&mut file, &entry(1, "hello", &[])).unwrap();
        writeln!(file, r#"{{"op":"unknown_thing","id":1}}"#).unwrap();
        append_insert(&mut file, &entry(2, "world", &[])).unwrap();

        let replayed = replay(&path).unwrap();
        assert_eq!(replayed.len(), 2);
    }

    #[test]
    fn update_mutates_most_recent_occurrence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut file = open_append(&path).unwrap();
        append_insert(&mut file, &entry(1, "v1", &[])).unwrap();
        append_update_text(&mut file, 1, "v2").unwrap();
        append_update_text(&mut file, 1, "v3").unwrap();

        let replayed = replay(&path).unwrap();
        assert_eq!(replayed[0].text, "v3");
    }
}
