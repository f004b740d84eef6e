//! Orchestrates scanning, argument building, registry lookup and dispatch
//! for a single generation turn (spec.md §4.4, the Governor's "Run C4 over
//! the accumulator" step).

use ethervox_registry::ToolRegistry;

use crate::build::ToolCallArgBuilder;
use crate::error::ExtractError;
use crate::scan::scan_tool_calls;

/// Outcome of a single `<tool_call ... />` occurrence: either the tool's
/// dispatch result text, or an [`ExtractError`] the Governor will inject
/// back as a `<tool_error>`.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    pub name: Option<String>,
    pub result: Result<String, ExtractError>,
}

/// Result of extracting and dispatching every tool call in a buffer.
#[derive(Debug, Clone, Default)]
pub struct ExtractionBatch {
    pub outcomes: Vec<ToolCallOutcome>,
    /// True if more well-formed occurrences were present than `max_calls`
    /// allowed; the excess was ignored.
    pub truncated: bool,
}

/// Scan `text` for `<tool_call ... />` occurrences, build each call's JSON
/// arguments, look the tool up in `registry`, and invoke its dispatch
/// closure. At most `max_calls` occurrences are processed; any beyond that
/// are dropped and `truncated` is set (spec.md's per-iteration tool-call
/// cap).
pub fn extract_and_dispatch(text: &str, registry: &ToolRegistry, max_calls: usize) -> ExtractionBatch {
    let mut raw_calls = scan_tool_calls(text);

    let truncated = raw_calls.len() > max_calls;
    if truncated {
        tracing::warn!(
            found = raw_calls.len(),
            max_calls,
            "too many tool calls in one iteration, truncating"
        );
        raw_calls.truncate(max_calls);
    }

    let outcomes = raw_calls
        .into_iter()
        .map(|call| {
            let name = call.name().map(str::to_string);
            let result = dispatch_one(&name, &call.attrs, registry);
            ToolCallOutcome { name, result }
        })
        .collect();

    ExtractionBatch { outcomes, truncated }
}

fn dispatch_one(
    name: &Option<String>,
    attrs: &[(String, String)],
    registry: &ToolRegistry,
) -> Result<String, ExtractError> {
    let name = name.as_ref().ok_or(ExtractError::MissingName)?;

    let tool = registry
        .find(name)
        .ok_or_else(|| ExtractError::UnknownTool(name.clone()))?;

    let args = ToolCallArgBuilder::build(attrs);
    (tool.dispatch)(&args).map_err(ExtractError::DispatchFailed)
}
