//! Governor tuning knobs, with the defaults spec.md documents.

/// Tunables for one [`crate::Governor`] instance. Set once at construction;
/// the Governor does not support reconfiguration mid-lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorConfig {
    /// Confidence score (from a harvested `<confidence value="..." />` tag)
    /// above which the optimizer's tuning pass treats a run as high quality.
    /// The Governor itself only records the harvested value; this threshold
    /// is read by `ethervox-optimizer`.
    pub confidence_threshold: f64,
    /// Maximum think→call-tool→observe iterations per `execute` call.
    pub max_iterations: u32,
    /// Maximum `<tool_call ... />` occurrences dispatched per iteration;
    /// excess occurrences are truncated (see `ethervox_extract`).
    pub max_tool_calls_per_iteration: usize,
    /// Wall-clock budget for one `execute` call, checked at iteration
    /// boundaries.
    pub timeout_seconds: u64,
    /// Maximum tokens generated per iteration before the streaming loop is
    /// forced to stop regardless of stop-sequence detection.
    pub max_tokens_per_response: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.85,
            max_iterations: 5,
            max_tool_calls_per_iteration: 10,
            timeout_seconds: 30,
            max_tokens_per_response: 2048,
        }
    }
}
