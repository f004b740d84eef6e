//! CLI entry point for the EthervoxAI Governor.
//!
//! Subcommands are dispatched here; shared setup lives in [`helpers`].

mod cli;
mod helpers;

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use ethervox_governor::{Governor, GovernorConfig, GovernorStatus};
use ethervox_llm::{LlmBackend, MockLlmBackend};
use ethervox_memory::{ExportFormat, MemoryStore};
use ethervox_registry::{PlatformMode, ToolRegistry};
use tracing::{info, warn};

use crate::cli::{Cli, Commands, MemoryAction};
use crate::helpers::{data_dir, init_tracing, register_demo_tools};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { model_path, family } => cmd_run(&model_path, family.as_deref()),
        Commands::Optimize { model_path } => cmd_optimize(&model_path),
        Commands::Memory { action } => cmd_memory(action),
    }
}

/// No real `llama-cpp`-style inference backend ships in this workspace
/// (spec.md §1 scopes it out as an external collaborator) — this stands
/// in so the CLI can demonstrate the full wiring end to end.
fn load_backend() -> Box<dyn LlmBackend> {
    warn!("no inference backend is linked into this build; using the scripted mock backend");
    Box::new(MockLlmBackend::new(4096))
}

fn cmd_run(model_path: &str, family: Option<&str>) -> Result<()> {
    info!(model_path, "starting interactive session");

    let mut store = MemoryStore::new();
    store
        .init(None, Some(data_dir().join("memory")))
        .context("failed to initialize memory store")?;
    let store = Arc::new(Mutex::new(store));

    let registry = Arc::new(ToolRegistry::new());
    register_demo_tools(&registry, store.clone()).context("failed to register demo tools")?;

    let mut governor = Governor::init(GovernorConfig::default(), registry.clone());
    let memory_guard = store.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
    governor
        .load_model(model_path, family, PlatformMode::Desktop, Some(&*memory_guard), load_backend())
        .context("failed to load model")?;
    drop(memory_guard);

    println!("ethervox ready. Type a query and press enter; Ctrl-D to exit.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        {
            let mut store = store.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
            store.add(&line, &[], 0.5, true).ok();
        }

        let outcome = governor.execute(&line, None, None, None)?;
        match outcome.status {
            GovernorStatus::Success => println!("{}", outcome.response),
            GovernorStatus::Timeout => println!("[timed out after {} iterations]", outcome.metrics.iteration_count),
            GovernorStatus::Error => println!("[error] {}", outcome.error.unwrap_or_default()),
        }
        io::stdout().flush().ok();
    }

    governor.cleanup();
    Ok(())
}

fn cmd_optimize(model_path: &str) -> Result<()> {
    info!(model_path, "starting prompt-optimizer interview");

    let registry = Arc::new(ToolRegistry::new());
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    register_demo_tools(&registry, store.clone()).context("failed to register demo tools")?;

    let mut governor = Governor::init(GovernorConfig::default(), registry.clone());
    governor
        .load_model(model_path, None, PlatformMode::Desktop, None, load_backend())
        .context("failed to load model")?;

    let path = ethervox_optimizer::PromptOptimizer::run(&mut governor, &registry, model_path, &data_dir())?;
    governor.cleanup();

    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_memory(action: MemoryAction) -> Result<()> {
    let mut store = MemoryStore::new();
    store
        .init(None, Some(data_dir().join("memory")))
        .context("failed to initialize memory store")?;

    match action {
        MemoryAction::Search { query, tags, limit } => {
            let required_tags: Vec<String> = tags
                .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();
            let hits = store.search(query.as_deref(), &required_tags, limit);
            if hits.is_empty() {
                println!("no matching memories");
            }
            for hit in hits {
                println!("[{:.2}] {}", hit.relevance, hit.entry.text);
            }
        }
        MemoryAction::Export { path, format } => {
            let format: ExportFormat = format.parse().context("unrecognized export format")?;
            let count = store.export(std::path::Path::new(&path), format)?;
            println!("exported {count} memories to {path}");
        }
        MemoryAction::Import { path } => {
            let count = store.import(std::path::Path::new(&path))?;
            println!("imported {count} memories from {path}");
        }
        MemoryAction::Forget { older_than_seconds, importance_below } => {
            let count = store.forget(older_than_seconds, importance_below);
            println!("forgot {count} memories");
        }
    }

    Ok(())
}
