use std::time::Duration;

/// Per-`execute`-call metrics, returned alongside the final response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorMetrics {
    pub iteration_count: u32,
    pub tool_calls_made: u32,
    pub tokens_generated: u64,
    pub elapsed: Duration,
    /// Last harvested `<confidence value="..." />` reading, or `0.0` if the
    /// model never emitted one.
    pub confidence: f64,
}

impl Default for GovernorMetrics {
    fn default() -> Self {
        Self {
            iteration_count: 0,
            tool_calls_made: 0,
            tokens_generated: 0,
            elapsed: Duration::ZERO,
            confidence: 0.0,
        }
    }
}
