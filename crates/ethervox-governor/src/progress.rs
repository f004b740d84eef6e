//! Progress observability.
//!
//! The source C ABI reports progress through an opaque user-data pointer and
//! a function-pointer callback; there is no such boundary in-process here, so
//! callbacks are plain `Arc<dyn Fn(..) + Send + Sync>` closures, the same
//! shape `openintent-agent::runtime` uses for its `TextDeltaCallback`/
//! `ToolStartCallback` hooks.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::status::GovernorStatus;

/// One step of the reasoning loop's progress, in the taxonomy spec.md §6
/// names. `invocation_id` is the same value across every event emitted by
/// one `Governor::execute` call, letting a subscriber correlate events from
/// overlapping/interleaved invocations (mirroring `AgentContext::task_id` in
/// the teacher's runtime).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    IterationStart { invocation_id: Uuid, iteration: u32 },
    Thinking { invocation_id: Uuid, iteration: u32 },
    ToolCall { invocation_id: Uuid, name: String, arguments: Value },
    ToolResult { invocation_id: Uuid, name: String, result: String },
    ToolError { invocation_id: Uuid, name: String, error: String },
    ConfidenceUpdate { invocation_id: Uuid, confidence: f64 },
    Complete { invocation_id: Uuid, status: GovernorStatus },
}

/// Called once per progress event emitted over the course of `execute`.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Called once per streaming token that survives the suppression filter.
pub type TokenCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub(crate) fn emit(cb: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = cb {
        cb(&event);
    }
}
