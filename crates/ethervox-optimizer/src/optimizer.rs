//! Interviews the running model about its own tool set and persists the
//! answers as a per-model prompt file (spec.md §4.6).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use ethervox_governor::Governor;
use ethervox_registry::ToolRegistry;
use serde_json::json;

use crate::error::{OptimizerError, Result};
use crate::family::family_name;
use crate::prompts::{OptimizedPrompts, ToolPromptEntry};

const CANNED_STARTUP_INSTRUCTION: &str =
    "Use the tool-calling conventions recorded in tool_prompts_<family>.json for this session.";

/// Runs the interview and writes `<storage_dir>/tool_prompts_<family>.json`.
/// `governor` must already be past `load_model`.
pub struct PromptOptimizer;

impl PromptOptimizer {
    pub fn run(
        governor: &mut Governor,
        registry: &ToolRegistry,
        model_path: &str,
        storage_dir: &Path,
    ) -> Result<PathBuf> {
        fs::create_dir_all(storage_dir)?;

        let preferences = ask(
            governor,
            "In one or two sentences, what instruction style works best for you when deciding whether to call a tool?",
        )?;

        let tools = registry.list();
        let mut entries = Vec::with_capacity(tools.len());
        for tool in &tools {
            let when = ask(
                governor,
                &format!(
                    "In one concise sentence, when should the \"{}\" tool be called?",
                    tool.name
                ),
            )?;
            let example = ask(
                governor,
                &format!(
                    "Write one realistic example user utterance that should trigger the \"{}\" tool.",
                    tool.name
                ),
            )?;
            entries.push(ToolPromptEntry { name: tool.name.clone(), when, example });
        }

        let document = OptimizedPrompts {
            model_path: model_path.to_string(),
            generated_at: Utc::now().timestamp(),
            preferences,
            tools: entries,
        };

        let family = family_name(model_path);
        let path = storage_dir.join(format!("tool_prompts_{family}.json"));
        let bytes = serde_json::to_vec_pretty(&document)?;
        fs::write(&path, bytes)?;

        notify_startup_prompt_update(registry);

        tracing::info!(family, path = %path.display(), "prompt-optimizer run complete");
        Ok(path)
    }
}

fn ask(governor: &mut Governor, question: &str) -> Result<String> {
    let outcome = governor.execute(question, None, None, None)?;
    Ok(outcome.response.trim().to_string())
}

fn notify_startup_prompt_update(registry: &ToolRegistry) {
    let Some(tool) = registry.find("startup_prompt_update") else {
        return;
    };
    let args = json!({ "instruction": CANNED_STARTUP_INSTRUCTION });
    if let Err(e) = (tool.dispatch)(&args) {
        tracing::warn!(error = %e, "startup_prompt_update dispatch failed");
    }
}

/// Reads `<storage_dir>/tool_prompts_<family(model_path)>.json`, if present.
pub fn load_optimized_prompts(storage_dir: &Path, model_path: &str) -> Result<Option<OptimizedPrompts>> {
    let family = family_name(model_path);
    let path = storage_dir.join(format!("tool_prompts_{family}.json"));
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path).map_err(OptimizerError::from)?;
    let parsed = serde_json::from_slice(&bytes)?;
    Ok(Some(parsed))
}
