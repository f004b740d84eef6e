//! CLI argument definitions for the EthervoxAI Governor.

use clap::{Parser, Subcommand};

/// ethervox -- local on-device voice-assistant reasoning core.
#[derive(Parser)]
#[command(
    name = "ethervox",
    version,
    about = "EthervoxAI Governor -- local reasoning and tool-orchestration core",
    long_about = "Drives a local LLM through iterative think-call-tool-observe \
                  cycles against a registry of tools, backed by a persistent \
                  conversation memory store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session against a loaded model.
    Run {
        /// Path to the GGUF model file.
        model_path: String,

        /// Model family override (qwen, granite, phi, llama3). Auto-detected
        /// from the filename if omitted.
        #[arg(long)]
        family: Option<String>,
    },

    /// Interview the model about its own tool set and persist the answers.
    Optimize {
        /// Path to the GGUF model file.
        model_path: String,
    },

    /// Inspect or manage the persistent conversation memory store.
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

/// Actions for managing conversation memory.
#[derive(Subcommand)]
pub enum MemoryAction {
    /// Search stored memories.
    Search {
        /// Free-text query.
        query: Option<String>,

        /// Required tags (comma-separated).
        #[arg(long)]
        tags: Option<String>,

        /// Maximum number of results.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export all memories to a file.
    Export {
        /// Destination path.
        path: String,

        /// Export format: json or markdown.
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Import memories from a previously exported file.
    Import {
        /// Source path.
        path: String,
    },

    /// Delete low-importance memories older than a given age.
    Forget {
        /// Minimum age, in seconds.
        #[arg(long, default_value_t = 86_400)]
        older_than_seconds: u64,

        /// Only delete memories with importance strictly below this value.
        #[arg(long, default_value_t = 0.3)]
        importance_below: f64,
    },
}
