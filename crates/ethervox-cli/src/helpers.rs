//! Shared helpers used across subcommands: tracing setup, the default
//! `~/.ethervox` data directory, and demo tool registration.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ethervox_memory::MemoryStore;
use ethervox_registry::{ToolDefinition, ToolRegistry};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the given default log level,
/// honoring `RUST_LOG` when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// `~/.ethervox`, or `./.ethervox` if `$HOME` isn't set.
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".ethervox")
}

/// Registers the small set of demo tools the reference CLI ships with:
/// a calculator and a memory-search tool backed by `store`. Real
/// deployments are expected to register platform-specific tools (timer,
/// time-query, etc.) the same way — tool implementations are out of
/// scope for this workspace (spec.md §1).
pub fn register_demo_tools(registry: &ToolRegistry, store: Arc<Mutex<MemoryStore>>) -> ethervox_registry::Result<()> {
    registry.register(
        ToolDefinition::new(
            "calculator_compute",
            "Evaluate a simple arithmetic expression.",
            r#"{"type":"object","properties":{"expression":{"type":"string"}}}"#,
            Arc::new(|args| {
                let expr = args
                    .get("expression")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| "missing \"expression\" argument".to_string())?;
                meval(expr).map(|v| v.to_string())
            }),
        )
        .with_latency_ms(5),
    )?;

    registry.register(
        ToolDefinition::new(
            "memory_search",
            "Search past conversation memory for relevant context.",
            r#"{"type":"object","properties":{"query":{"type":"string"}}}"#,
            Arc::new(move |args| {
                let query = args.get("query").and_then(|v| v.as_str());
                let mut store = store.lock().map_err(|_| "memory store lock poisoned".to_string())?;
                let hits = store.search(query, &[], 5);
                if hits.is_empty() {
                    return Ok("no matching memories".to_string());
                }
                Ok(hits
                    .into_iter()
                    .map(|h| h.entry.text)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }),
        )
        .non_deterministic()
        .stateful()
        .with_latency_ms(15),
    )?;

    Ok(())
}

/// Evaluates `a op b` for a single binary operator (`+ - * /`); enough for
/// the demo calculator tool without pulling in a full expression parser.
fn meval(expr: &str) -> Result<f64, String> {
    let expr = expr.trim();
    for op in ['+', '-', '*', '/'] {
        if let Some(idx) = expr.rfind(op) {
            if idx == 0 {
                continue;
            }
            let (lhs, rhs) = expr.split_at(idx);
            let rhs = &rhs[1..];
            let a: f64 = lhs.trim().parse().map_err(|_| format!("bad operand: {lhs}"))?;
            let b: f64 = rhs.trim().parse().map_err(|_| format!("bad operand: {rhs}"))?;
            return Ok(match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' if b != 0.0 => a / b,
                '/' => return Err("division by zero".to_string()),
                _ => unreachable!(),
            });
        }
    }
    expr.trim().parse().map_err(|_| format!("not a number: {expr}"))
}
