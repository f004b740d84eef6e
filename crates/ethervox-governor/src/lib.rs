//! The Governor: the deterministic think -> call-tool -> observe loop that
//! drives an LLM backend through `C2` (tool registry) and `C4` (tool-call
//! extraction) to answer one user query (spec.md §4.5).

pub mod cancellation;
pub mod config;
pub mod error;
pub mod governor;
pub mod metrics;
pub mod progress;
pub mod state;
pub mod status;
pub mod streaming;

pub use cancellation::CancellationToken;
pub use config::GovernorConfig;
pub use error::{GovernorError, Result};
pub use governor::{ExecuteOutcome, Governor};
pub use metrics::GovernorMetrics;
pub use progress::{ProgressCallback, ProgressEvent, TokenCallback};
pub use state::GovernorState;
pub use status::GovernorStatus;

#[cfg(test)]
mod tests {
    use super::*;
    use ethervox_llm::MockLlmBackend;
    use ethervox_registry::{PlatformMode, ToolDefinition, ToolRegistry};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn calculator_tool() -> ToolDefinition {
        ToolDefinition::new(
            "calculator_compute",
            "evaluate a simple arithmetic expression",
            "{}",
            Arc::new(|args: &Value| {
                let expr = args.get("expression").and_then(|v| v.as_str()).unwrap_or("");
                if expr.contains("47.50") {
                    Ok("7.125".to_string())
                } else {
                    Ok("0".to_string())
                }
            }),
        )
    }

    fn registry_with(tools: Vec<ToolDefinition>) -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool).unwrap();
        }
        Arc::new(registry)
    }

    fn governor_with(registry: Arc<ToolRegistry>, backend: MockLlmBackend) -> Governor {
        let mut governor = Governor::init(GovernorConfig::default(), registry);
        governor
            .load_model("mock-qwen-7b.gguf", None, PlatformMode::Desktop, None, Box::new(backend))
            .unwrap();
        governor
    }

    // S1: arithmetic question resolved via calculator_compute, then a final
    // answer with a harvested confidence tag.
    #[test]
    fn s1_arithmetic_uses_calculator_then_answers() {
        let backend = MockLlmBackend::new(8192);
        backend.queue_response(
            "Let me compute that. <tool_call name=\"calculator_compute\" expression=\"47.50 * 0.15\" />",
        );
        backend.queue_response("The tip is $7.125. <confidence value=\"0.95\" />");

        let registry = registry_with(vec![calculator_tool()]);
        let mut governor = governor_with(registry, backend);

        let outcome = governor
            .execute("What's a 15% tip on $47.50?", None, None, None)
            .unwrap();

        assert_eq!(outcome.status, GovernorStatus::Success);
        assert_eq!(outcome.metrics.tool_calls_made, 1);
        assert_eq!(outcome.metrics.iteration_count, 2);
        assert!(outcome.response.contains("7.125"));
        assert!((outcome.metrics.confidence - 0.95).abs() < f64::EPSILON);
    }

    // S2: the model answers directly without ever emitting a tool call.
    #[test]
    fn s2_direct_answer_skips_tool_loop() {
        let backend = MockLlmBackend::new(8192);
        backend.queue_response("Paris is the capital of France.");

        let registry = registry_with(vec![]);
        let mut governor = governor_with(registry, backend);

        let outcome = governor
            .execute("What is the capital of France?", None, None, None)
            .unwrap();

        assert_eq!(outcome.status, GovernorStatus::Success);
        assert_eq!(outcome.metrics.tool_calls_made, 0);
        assert_eq!(outcome.metrics.iteration_count, 1);
        assert!(outcome.response.contains("Paris"));
    }

    // S3: a memory_search tool backed by a real ethervox-memory store.
    #[test]
    fn s3_memory_recall_via_memory_search_tool() {
        let memory = Arc::new(Mutex::new(ethervox_memory::MemoryStore::new()));
        memory.lock().unwrap().init(Some("gov-test".to_string()), None).unwrap();
        memory
            .lock()
            .unwrap()
            .add("User's dog is named Biscuit", &["personal".to_string()], 0.8, true)
            .unwrap();

        let search_memory = memory.clone();
        let memory_search = ToolDefinition::new(
            "memory_search",
            "search stored conversation memory",
            "{}",
            Arc::new(move |args: &Value| {
                let query = args.get("value").and_then(|v| v.as_str());
                let mut store = search_memory.lock().expect("memory lock poisoned");
                let hits = store.search(query, &[], 5);
                Ok(hits.into_iter().map(|h| h.entry.text).collect::<Vec<_>>().join("; "))
            }),
        );

        let backend = MockLlmBackend::new(8192);
        backend.queue_response(
            "Let me check. <tool_call name=\"memory_search\" value=\"dog\" />",
        );
        backend.queue_response("Your dog is named Biscuit.");

        let registry = registry_with(vec![memory_search]);
        let mut governor = governor_with(registry, backend);

        let outcome = governor
            .execute("What's my dog's name?", None, None, None)
            .unwrap();

        assert_eq!(outcome.status, GovernorStatus::Success);
        assert_eq!(outcome.metrics.tool_calls_made, 1);
        assert!(outcome.response.contains("Biscuit"));
    }

    // S4: an unknown tool call never drives execute to an Error status; the
    // Governor injects a <tool_error> and keeps going.
    #[test]
    fn s4_unknown_tool_never_yields_error_status() {
        let backend = MockLlmBackend::new(8192);
        backend.queue_response("<tool_call name=\"time_travel\" to=\"yesterday\" />");
        backend.queue_response("Sorry, I can't do that, but here's what I can tell you.");

        let registry = registry_with(vec![]);
        let mut governor = governor_with(registry, backend);

        let outcome = governor
            .execute("Can you go back in time?", None, None, None)
            .unwrap();

        assert_ne!(outcome.status, GovernorStatus::Error);
        assert_eq!(outcome.status, GovernorStatus::Success);
        assert_eq!(outcome.metrics.iteration_count, 2);
    }

    // Property: execute before load_model is rejected without panicking.
    #[test]
    fn execute_before_load_model_is_rejected() {
        let registry = registry_with(vec![]);
        let mut governor = Governor::init(GovernorConfig::default(), registry);
        let err = governor.execute("hello", None, None, None);
        assert!(matches!(err, Err(GovernorError::NotLoaded)));
    }

    // Property: the KV position is never rewound past the system prompt's
    // token count, even across repeated execute calls.
    #[test]
    fn kv_position_never_drops_below_system_prompt_length() {
        let backend = MockLlmBackend::new(8192);
        backend.queue_response("first answer");
        backend.queue_response("second answer");

        let registry = registry_with(vec![]);
        let mut governor = governor_with(registry, backend);

        governor.execute("one", None, None, None).unwrap();
        let state_after_first = governor.state();
        assert!(state_after_first.current_kv_pos >= state_after_first.system_prompt_token_count);

        governor.execute("two", None, None, None).unwrap();
        let state_after_second = governor.state();
        assert!(state_after_second.current_kv_pos >= state_after_second.system_prompt_token_count);
    }

    // Property: max_iterations is honored as a hard ceiling when the model
    // keeps calling tools and never answers directly.
    #[test]
    fn max_iterations_reached_yields_timeout_status() {
        let backend = MockLlmBackend::new(8192);
        let config = GovernorConfig {
            max_iterations: 2,
            ..GovernorConfig::default()
        };
        for _ in 0..5 {
            backend.queue_response("<tool_call name=\"calculator_compute\" expression=\"47.50\" />");
        }

        let registry = registry_with(vec![calculator_tool()]);
        let mut governor = Governor::init(config, registry);
        governor
            .load_model("mock-qwen-7b.gguf", None, PlatformMode::Desktop, None, Box::new(backend))
            .unwrap();

        let outcome = governor.execute("keep computing", None, None, None).unwrap();
        assert_eq!(outcome.status, GovernorStatus::Timeout);
        assert_eq!(outcome.metrics.iteration_count, 2);
    }

    // Property: a cancelled token stops the loop before max_iterations.
    #[test]
    fn cancellation_token_stops_the_loop() {
        let backend = MockLlmBackend::new(8192);
        backend.queue_response("<tool_call name=\"calculator_compute\" expression=\"47.50\" />");

        let registry = registry_with(vec![calculator_tool()]);
        let mut governor = governor_with(registry, backend);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = governor
            .execute("keep computing", None, None, Some(cancel))
            .unwrap();
        assert_eq!(outcome.status, GovernorStatus::Timeout);
        assert_eq!(outcome.metrics.iteration_count, 0);
    }
}
