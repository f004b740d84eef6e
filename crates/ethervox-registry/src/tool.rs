//! Tool definitions.
//!
//! The source C implementation passes mutable globals into tools because
//! dispatch functions share a fixed `(json_in, result_out, error_out)` C
//! signature. Here each tool instead owns a closure over whatever context it
//! needs (§9 of the spec's Design Notes, option (a)) — a `memory_search` tool
//! closes over an `Arc<MemoryStore>`, a `calculator_compute` tool closes over
//! nothing at all.

use std::sync::Arc;

use serde_json::Value;

/// The result of invoking a tool's dispatch function.
pub type DispatchResult = std::result::Result<String, String>;

/// A tool's dispatch function: takes the assembled argument JSON, returns
/// either a JSON result string or a human-readable error string. Ownership of
/// the returned string is the caller's from the moment it's returned — no
/// manual free/release protocol is needed in Rust.
pub type DispatchFn = Arc<dyn Fn(&Value) -> DispatchResult + Send + Sync>;

/// A single entry in the [`crate::registry::ToolRegistry`].
#[derive(Clone)]
pub struct ToolDefinition {
    /// Unique name within the registry, at most 63 bytes.
    pub name: String,
    /// Human-readable description, used in system-prompt synthesis.
    pub description: String,
    /// JSON-schema text describing the tool's parameters (informational —
    /// the extractor does not introspect it at dispatch time, per spec).
    pub parameters_schema: String,
    /// The dispatch closure.
    pub dispatch: DispatchFn,
    /// Whether repeated calls with the same arguments produce the same
    /// result (affects caching/retry policy upstream, informational here).
    pub deterministic: bool,
    /// Whether invoking this tool requires explicit user confirmation.
    pub requires_confirmation: bool,
    /// Whether this tool mutates shared state (e.g. the memory store).
    pub stateful: bool,
    /// Rough expected latency, used for UI progress estimation.
    pub estimated_latency_ms: u32,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("deterministic", &self.deterministic)
            .field("requires_confirmation", &self.requires_confirmation)
            .field("stateful", &self.stateful)
            .field("estimated_latency_ms", &self.estimated_latency_ms)
            .finish()
    }
}

impl ToolDefinition {
    /// Construct a tool definition with the common defaults (deterministic,
    /// no confirmation required, stateless, ~10ms).
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: impl Into<String>,
        dispatch: DispatchFn,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: parameters_schema.into(),
            dispatch,
            deterministic: true,
            requires_confirmation: false,
            stateful: false,
            estimated_latency_ms: 10,
        }
    }

    /// Builder: mark non-deterministic.
    pub fn non_deterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    /// Builder: mark as requiring confirmation.
    pub fn requires_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    /// Builder: mark as stateful.
    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    /// Builder: set estimated latency.
    pub fn with_latency_ms(mut self, ms: u32) -> Self {
        self.estimated_latency_ms = ms;
        self
    }
}
