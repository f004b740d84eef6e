//! The conversation memory store: ordered entries, a tag-inverted index,
//! and an optional append-only JSONL log (spec.md §4.3).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use ethervox_registry::{CorrectionsSource, PromptMemoryHint};
use serde::{Deserialize, Serialize};

use crate::entry::{
    clamp_importance, normalize_tags, normalize_tools_called, truncate_text, MemoryEntry,
};
use crate::error::{MemoryError, Result};
use crate::export::ExportFormat;
use crate::log;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub stored: u64,
    pub total_searches: u64,
    pub total_exports: u64,
}

/// One scored hit from [`MemoryStore::search`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: MemoryEntry,
    pub relevance: f64,
}

/// Ordered log of tagged, timestamped, importance-scored memory entries
/// with a tag-inverted index and an optional append-only JSONL backing
/// file (spec.md §4.3).
pub struct MemoryStore {
    session_id: String,
    storage_dir: Option<PathBuf>,
    session_started: i64,

    entries: Vec<MemoryEntry>,
    tag_index: HashMap<String, BTreeSet<u64>>,
    counters: Counters,

    next_id: u64,
    next_turn: u64,

    log_file: Option<File>,
    initialized: bool,
}

impl MemoryStore {
    /// An uninitialized, empty store shell. Call [`MemoryStore::init`]
    /// before use.
    pub fn new() -> Self {
        Self {
            session_id: String::new(),
            storage_dir: None,
            session_started: 0,
            entries: Vec::new(),
            tag_index: HashMap::new(),
            counters: Counters::default(),
            next_id: 1,
            next_turn: 1,
            log_file: None,
            initialized: false,
        }
    }

    /// Initialize the store. If `storage_dir` is given and a log file for
    /// `session_id` already exists, it is replayed to reconstruct state;
    /// otherwise a fresh log is created. Fails with
    /// [`MemoryError::AlreadyInitialized`] if called twice without an
    /// intervening [`MemoryStore::cleanup`].
    pub fn init(&mut self, session_id: Option<String>, storage_dir: Option<PathBuf>) -> Result<()> {
        if self.initialized {
            return Err(MemoryError::AlreadyInitialized);
        }

        self.session_id = session_id.unwrap_or_else(|| format!("session-{}", Utc::now().timestamp()));
        self.session_started = Utc::now().timestamp();
        self.storage_dir = storage_dir;

        if let Some(dir) = &self.storage_dir {
            fs::create_dir_all(dir)?;
            let path = self.log_path(dir);

            if path.exists() {
                let entries = log::replay(&path)?;
                for entry in &entries {
                    self.index_entry(entry);
                }
                self.next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
                self.next_turn = entries.iter().map(|e| e.turn_id).max().unwrap_or(0) + 1;
                self.counters.stored = entries.len() as u64;
                self.entries = entries;
            }

            self.log_file = Some(log::open_append(&path)?);
        }

        self.initialized = true;
        tracing::info!(session_id = %self.session_id, entries = self.entries.len(), "memory store initialized");
        Ok(())
    }

    fn log_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.jsonl", self.session_id))
    }

    fn require_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(MemoryError::NotInitialized)
        }
    }

    fn index_entry(&mut self, entry: &MemoryEntry) {
        for tag in &entry.tags {
            self.tag_index.entry(tag.clone()).or_default().insert(entry.id);
        }
    }

    fn deindex_entry(&mut self, entry: &MemoryEntry) {
        for tag in &entry.tags {
            if let Some(bucket) = self.tag_index.get_mut(tag) {
                bucket.remove(&entry.id);
                if bucket.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }

    /// Insert a new entry. Clamps `importance`, truncates `tags` to 16 and
    /// `text` to 8192 bytes, assigns the next monotonic `memory_id`/`turn_id`.
    pub fn add(
        &mut self,
        text: &str,
        tags: &[String],
        importance: f64,
        is_user: bool,
    ) -> Result<u64> {
        self.require_initialized()?;

        let entry = MemoryEntry {
            id: self.next_id,
            turn_id: self.next_turn,
            timestamp: Utc::now().timestamp(),
            text: truncate_text(text),
            tags: normalize_tags(tags),
            importance: clamp_importance(importance),
            is_user_message: is_user,
            tools_called: Vec::new(),
        };
        self.next_id += 1;
        self.next_turn += 1;

        self.persist_insert(&entry)?;
        self.index_entry(&entry);
        self.counters.stored += 1;
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Convenience wrapper: records `text` as a user correction
    /// (`CORRECTION: ` prefix, `{correction, high_priority}` tags,
    /// importance 0.99).
    pub fn add_correction(&mut self, text: &str, context: Option<&str>) -> Result<u64> {
        let full_text = match context {
            Some(ctx) => format!("CORRECTION: {text} (context: {ctx})"),
            None => format!("CORRECTION: {text}"),
        };
        let tags = vec!["correction".to_string(), "high_priority".to_string()];
        self.add(&full_text, &tags, 0.99, false)
    }

    /// Convenience wrapper: records `text` as a successful pattern
    /// (`SUCCESS PATTERN: ` prefix, `{pattern, success}` tags, importance
    /// 0.90).
    pub fn add_pattern(&mut self, text: &str) -> Result<u64> {
        let full_text = format!("SUCCESS PATTERN: {text}");
        let tags = vec!["pattern".to_string(), "success".to_string()];
        self.add(&full_text, &tags, 0.90, false)
    }

    /// Record which tools were invoked while producing a turn. Informational
    /// metadata only — does not affect tag indexing.
    pub fn record_tools_called(&mut self, memory_id: u64, tools: &[String]) -> Result<()> {
        self.require_initialized()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == memory_id)
            .ok_or(MemoryError::NotFound(memory_id))?;
        entry.tools_called = normalize_tools_called(tools);
        Ok(())
    }

    /// Replace an entry's tag set, re-indexing it and persisting an
    /// `{op:"update", id, tags}` record.
    pub fn update_tags(&mut self, memory_id: u64, new_tags: &[String]) -> Result<()> {
        self.require_initialized()?;
        let new_tags = normalize_tags(new_tags);

        let idx = self
            .entries
            .iter()
            .position(|e| e.id == memory_id)
            .ok_or(MemoryError::NotFound(memory_id))?;

        let old = self.entries[idx].clone();
        self.deindex_entry(&old);
        self.entries[idx].tags = new_tags.clone();
        self.index_entry(&self.entries[idx].clone());

        if let Some(file) = self.log_file.as_mut() {
            log::append_update_tags(file, memory_id, &new_tags)?;
        }
        Ok(())
    }

    /// Replace an entry's text and persist an `{op:"update_text", id, text}`
    /// record.
    pub fn update_text(&mut self, memory_id: u64, new_text: &str) -> Result<()> {
        self.require_initialized()?;
        let new_text = truncate_text(new_text);

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == memory_id)
            .ok_or(MemoryError::NotFound(memory_id))?;
        entry.text = new_text.clone();

        if let Some(file) = self.log_file.as_mut() {
            log::append_update_text(file, memory_id, &new_text)?;
        }
        Ok(())
    }

    pub fn get_by_id(&self, memory_id: u64) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == memory_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tag_count(&self) -> usize {
        self.tag_index.len()
    }

    /// Search entries: intersect `required_tags`' id buckets (if any), score
    /// by token overlap against `query` (or recency if `query` is empty),
    /// return the top `limit` by score descending, recency as tiebreak.
    pub fn search(
        &mut self,
        query: Option<&str>,
        required_tags: &[String],
        limit: usize,
    ) -> Vec<SearchResult> {
        self.counters.total_searches += 1;

        let candidate_ids: Vec<u64> = if required_tags.is_empty() {
            self.entries.iter().map(|e| e.id).collect()
        } else {
            let mut sets = required_tags.iter().filter_map(|t| self.tag_index.get(t));
            match sets.next() {
                None => Vec::new(),
                Some(first) => {
                    let mut acc: BTreeSet<u64> = first.clone();
                    for set in sets {
                        acc = acc.intersection(set).copied().collect();
                    }
                    acc.into_iter().collect()
                }
            }
        };

        let query_words: Vec<String> = query
            .unwrap_or_default()
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<SearchResult> = candidate_ids
            .into_iter()
            .filter_map(|id| self.get_by_id(id).cloned())
            .map(|entry| {
                let relevance = if query_words.is_empty() {
                    recency_score(entry.timestamp, self.session_started)
                } else {
                    token_overlap_score(&entry.text, &query_words)
                };
                SearchResult { entry, relevance }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.entry.timestamp.cmp(&a.entry.timestamp))
                .then_with(|| b.entry.id.cmp(&a.entry.id))
        });
        scored.truncate(limit);
        scored
    }

    /// A deterministic, rule-based digest of the last `window_size` entries
    /// (optionally filtered to those mentioning `focus_topic`): a summary
    /// paragraph plus the highest-importance preview lines as key points.
    pub fn summarize(
        &self,
        window_size: usize,
        focus_topic: Option<&str>,
    ) -> (String, Vec<String>) {
        let start = self.entries.len().saturating_sub(window_size);
        let window: Vec<&MemoryEntry> = self.entries[start..]
            .iter()
            .filter(|e| match focus_topic {
                Some(topic) if !topic.is_empty() => e.text.to_lowercase().contains(&topic.to_lowercase()),
                _ => true,
            })
            .collect();

        let mut by_importance = window.clone();
        by_importance.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let key_points: Vec<String> = by_importance
            .iter()
            .take(5)
            .map(|e| preview(&e.text, 80))
            .collect();

        let summary_text = if window.is_empty() {
            "No matching turns in the requested window.".to_string()
        } else {
            format!(
                "{} turn(s) reviewed{}.",
                window.len(),
                match focus_topic {
                    Some(t) if !t.is_empty() => format!(" focused on \"{t}\""),
                    _ => String::new(),
                }
            )
        };

        (summary_text, key_points)
    }

    /// Serialize the store to `path` in `format`, returning bytes written.
    pub fn export(&mut self, path: &Path, format: ExportFormat) -> Result<usize> {
        let bytes = match format {
            ExportFormat::Json => crate::export::to_json(
                &self.session_id,
                self.session_started,
                &self.counters,
                &self.entries,
            )?,
            ExportFormat::Markdown => {
                crate::export::to_markdown(&self.session_id, self.session_started, &self.entries)
            }
        };
        fs::write(path, &bytes)?;
        self.counters.total_exports += 1;
        Ok(bytes.len())
    }

    /// Load entries previously written by [`MemoryStore::export`] (JSON
    /// form), preserving their original ids/turn_ids/timestamps, and
    /// advance internal counters so subsequently auto-assigned ids never
    /// collide with imported ones.
    pub fn import(&mut self, path: &Path) -> Result<usize> {
        self.require_initialized()?;
        let bytes = fs::read(path)?;
        let imported = crate::export::from_json(&bytes)?;
        let count = imported.len();

        for entry in &imported {
            self.persist_insert(entry)?;
            self.index_entry(entry);
        }
        self.next_id = self
            .next_id
            .max(imported.iter().map(|e| e.id).max().unwrap_or(0) + 1);
        self.next_turn = self
            .next_turn
            .max(imported.iter().map(|e| e.turn_id).max().unwrap_or(0) + 1);
        self.counters.stored += count as u64;
        self.entries.extend(imported);

        Ok(count)
    }

    /// Remove every entry whose age exceeds `older_than_seconds` (0 =
    /// ignore) or whose importance is below `importance_below` (0.0 =
    /// ignore). Returns the number pruned.
    pub fn forget(&mut self, older_than_seconds: u64, importance_below: f64) -> usize {
        let now = Utc::now().timestamp();
        let ids: Vec<u64> = self
            .entries
            .iter()
            .filter(|e| {
                let too_old = older_than_seconds > 0
                    && (now - e.timestamp) as u64 > older_than_seconds;
                let too_unimportant = importance_below > 0.0 && e.importance < importance_below;
                too_old || too_unimportant
            })
            .map(|e| e.id)
            .collect();
        self.delete_by_ids(&ids)
    }

    /// Remove exactly the entries named in `ids`. Returns the number
    /// actually deleted.
    pub fn delete_by_ids(&mut self, ids: &[u64]) -> usize {
        let id_set: BTreeSet<u64> = ids.iter().copied().collect();
        let mut deleted = 0;
        self.entries.retain(|e| {
            if id_set.contains(&e.id) {
                deleted += 1;
                false
            } else {
                true
            }
        });
        for tag_ids in self.tag_index.values_mut() {
            for id in &id_set {
                tag_ids.remove(id);
            }
        }
        self.tag_index.retain(|_, ids| !ids.is_empty());
        deleted
    }

    /// Move every `*.jsonl` file in the storage directory that does not
    /// belong to the current session into `storage_dir/archive/`. Returns
    /// the number of files moved.
    pub fn archive_sessions(&self) -> Result<usize> {
        let Some(dir) = &self.storage_dir else {
            return Ok(0);
        };

        let archive_dir = dir.join("archive");
        let current_file_name = format!("{}.jsonl", self.session_id);
        let mut moved = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some(current_file_name.as_str()) {
                continue;
            }

            fs::create_dir_all(&archive_dir)?;
            let dest = archive_dir.join(path.file_name().unwrap());
            fs::rename(&path, &dest)?;
            moved += 1;
        }

        Ok(moved)
    }

    /// Flush and close the append log, release in-memory indices. A
    /// subsequent `init` with the same session id/storage dir replays the
    /// log back to the pre-cleanup state.
    pub fn cleanup(&mut self) -> Result<()> {
        self.log_file = None;
        self.tag_index.clear();
        self.entries.clear();
        self.initialized = false;
        Ok(())
    }

    fn persist_insert(&mut self, entry: &MemoryEntry) -> Result<()> {
        if let Some(file) = self.log_file.as_mut() {
            log::append_insert(file, entry)?;
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrectionsSource for MemoryStore {
    fn recent_corrections(&self, limit: usize) -> Vec<PromptMemoryHint> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.tags.iter().any(|t| t == "correction"))
            .take(limit)
            .map(|e| PromptMemoryHint::new(e.text.clone()))
            .collect()
    }

    fn recent_patterns(&self, limit: usize) -> Vec<PromptMemoryHint> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.tags.iter().any(|t| t == "pattern"))
            .take(limit)
            .map(|e| PromptMemoryHint::new(e.text.clone()))
            .collect()
    }
}

fn recency_score(timestamp: i64, session_started: i64) -> f64 {
    (timestamp - session_started).max(0) as f64
}

fn token_overlap_score(text: &str, query_words: &[String]) -> f64 {
    let lower = text.to_lowercase();
    let text_words: BTreeSet<&str> = lower.split_whitespace().collect();
    let overlap = query_words
        .iter()
        .filter(|w| text_words.contains(w.as_str()))
        .count();
    let substring_bonus = if query_words
        .iter()
        .any(|w| !w.is_empty() && lower.contains(w.as_str()))
    {
        0.5
    } else {
        0.0
    };
    overlap as f64 / query_words.len().max(1) as f64 + substring_bonus
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_at(dir: &Path, session: &str) -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .init(Some(session.to_string()), Some(dir.to_path_buf()))
            .unwrap();
        store
    }

    #[test]
    fn double_init_fails() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let err = store.init(Some("s1".to_string()), Some(dir.path().to_path_buf()));
        assert!(matches!(err, Err(MemoryError::AlreadyInitialized)));
    }

    #[test]
    fn add_assigns_monotonic_ids() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let id1 = store.add("first", &[], 0.5, true).unwrap();
        let id2 = store.add("second", &[], 0.5, true).unwrap();
        assert!(id2 > id1);
    }

    #[test]
    fn importance_is_clamped_on_ingress() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let id = store.add("x", &[], 5.0, true).unwrap();
        assert_eq!(store.get_by_id(id).unwrap().importance, 1.0);
    }

    #[test]
    fn tag_index_stays_consistent_after_delete() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let tags = vec!["a".to_string(), "b".to_string()];
        let id = store.add("x", &tags, 0.5, true).unwrap();
        store.delete_by_ids(&[id]);
        assert!(store.tag_index.get("a").is_none());
        assert!(store.tag_index.get("b").is_none());
    }

    #[test]
    fn correction_and_pattern_conventions() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let cid = store.add_correction("don't use Celsius", None).unwrap();
        let pid = store.add_pattern("name lookups via memory_search").unwrap();

        let correction = store.get_by_id(cid).unwrap();
        assert!(correction.text.starts_with("CORRECTION: "));
        assert_eq!(correction.importance, 0.99);
        assert!(correction.tags.contains(&"correction".to_string()));

        let pattern = store.get_by_id(pid).unwrap();
        assert!(pattern.text.starts_with("SUCCESS PATTERN: "));
        assert_eq!(pattern.importance, 0.90);
    }

    #[test]
    fn search_by_required_tags_intersects() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        store.add("a", &["x".to_string(), "y".to_string()], 0.5, true).unwrap();
        store.add("b", &["x".to_string()], 0.5, true).unwrap();
        store.add("c", &["y".to_string()], 0.5, true).unwrap();

        let results = store.search(None, &["x".to_string(), "y".to_string()], 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.text, "a");
    }

    #[test]
    fn search_by_query_scores_token_overlap() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        store.add("User's name is Tim", &["personal".to_string()], 0.95, true).unwrap();
        store.add("The weather is nice today", &[], 0.3, true).unwrap();

        let results = store.search(Some("name"), &[], 10);
        assert_eq!(results[0].entry.text, "User's name is Tim");
    }

    #[test]
    fn log_replay_round_trip_preserves_state() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        let id1 = store.add("first", &["t1".to_string()], 0.5, true).unwrap();
        let id2 = store.add("second", &["t2".to_string()], 0.7, false).unwrap();
        store.update_tags(id1, &["t1".to_string(), "extra".to_string()]).unwrap();
        store.update_text(id2, "second, revised").unwrap();
        store.cleanup().unwrap();

        let mut reloaded = MemoryStore::new();
        reloaded
            .init(Some("s1".to_string()), Some(dir.path().to_path_buf()))
            .unwrap();

        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get_by_id(id1).unwrap().tags,
            vec!["t1".to_string(), "extra".to_string()]
        );
        assert_eq!(reloaded.get_by_id(id2).unwrap().text, "second, revised");
    }

    #[test]
    fn export_import_round_trip_preserves_fields() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        for i in 0..5 {
            store
                .add(&format!("entry {i}"), &[format!("tag{i}")], 0.1 * i as f64, i % 2 == 0)
                .unwrap();
        }

        let export_path = dir.path().join("export.json");
        store.export(&export_path, ExportFormat::Json).unwrap();

        let mut fresh = store_at(dir.path(), "s2");
        let loaded = fresh.import(&export_path).unwrap();
        assert_eq!(loaded, 5);
        assert_eq!(fresh.len(), 5);
        assert_eq!(fresh.tag_count(), 5);
    }

    #[test]
    fn archive_sessions_moves_other_logs_not_current() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "current");
        store.add("hi", &[], 0.5, true).unwrap();

        fs::write(dir.path().join("old1.jsonl"), "{}").unwrap();
        fs::write(dir.path().join("old2.jsonl"), "{}").unwrap();

        let moved = store.archive_sessions().unwrap();
        assert_eq!(moved, 2);
        assert!(dir.path().join("archive/old1.jsonl").exists());
        assert!(dir.path().join("current.jsonl").exists());
    }

    #[test]
    fn forget_respects_zero_means_ignore() {
        let dir = tempdir().unwrap();
        let mut store = store_at(dir.path(), "s1");
        store.add("unimportant", &[], 0.01, true).unwrap();
        store.add("important", &[], 0.9, true).unwrap();

        let pruned = store.forget(0, 0.5);
        assert_eq!(pruned, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id(2).unwrap().text, "important");
    }
}
