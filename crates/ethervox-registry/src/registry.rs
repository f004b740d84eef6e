//! Tool registry and system-prompt synthesis.
//!
//! The registry is an append-only, ordered sequence of [`ToolDefinition`]s.
//! It grows by doubling and never removes entries; lookup is a linear scan,
//! which is fine because registries top out around 32 tools (spec.md §3).

use std::sync::RwLock;

use ethervox_template::ChatTemplate;

use crate::error::{RegistryError, Result};
use crate::tool::ToolDefinition;

/// Platform-sensitivity hint consulted by system-prompt synthesis. Purely a
/// design hint per spec.md §4.2 — both variants must still make the model
/// emit well-formed `<tool_call ... />` markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformMode {
    /// Terser preamble — fewer tokens spent on framing.
    Mobile,
    /// Fuller preamble with more usage guidance.
    Desktop,
}

/// A single correction or pattern memory, as interpolated into the system
/// prompt. Kept deliberately minimal — just the text the prompt needs.
#[derive(Debug, Clone)]
pub struct PromptMemoryHint {
    pub text: String,
}

impl PromptMemoryHint {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Implemented by the memory store so the registry can pull in recent
/// corrections/patterns without a circular crate dependency.
pub trait CorrectionsSource {
    /// Up to `limit` most-recent "correction" entries, newest first.
    fn recent_corrections(&self, limit: usize) -> Vec<PromptMemoryHint>;
    /// Up to `limit` most-recent "pattern" entries, newest first.
    fn recent_patterns(&self, limit: usize) -> Vec<PromptMemoryHint>;
}

const MEMORY_HINTS_PER_SECTION: usize = 5;

/// Append-only catalog of named tools.
pub struct ToolRegistry {
    tools: RwLock<Vec<ToolDefinition>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(Vec::with_capacity(8)),
        }
    }

    /// Register a new tool. Fails with [`RegistryError::DuplicateName`] if a
    /// tool with the same name already exists; this is the registry's sole
    /// invariant.
    pub fn register(&self, tool: ToolDefinition) -> Result<()> {
        let mut tools = self
            .tools
            .write()
            .map_err(|_| RegistryError::AllocationFailed(tool.name.clone()))?;

        if tools.iter().any(|t| t.name == tool.name) {
            return Err(RegistryError::DuplicateName(tool.name));
        }

        if tools.len() == tools.capacity() {
            tools.reserve(tools.capacity().max(1));
        }

        tracing::info!(tool = %tool.name, "tool registered");
        tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn find(&self, name: &str) -> Option<ToolDefinition> {
        self.tools
            .read()
            .ok()?
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every registered tool, in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.read().map(|t| t.clone()).unwrap_or_default()
    }

    /// Synthesize the system prompt: template system-frame wrapping a
    /// platform-sensitive preamble, the enumerated tool list, optional
    /// correction/pattern sections, and 1-4 exemplar tool-call lines.
    pub fn build_system_prompt(
        &self,
        template: &ChatTemplate,
        platform: PlatformMode,
        memory: Option<&dyn CorrectionsSource>,
    ) -> Result<String> {
        let tools = self.list();

        let mut body = String::new();
        body.push_str(preamble(platform));
        body.push_str("\n\n");

        body.push_str("Available tools:\n");
        for tool in &tools {
            body.push_str(&format!("- {} — {}\n", tool.name, tool.description));
        }
        body.push('\n');

        if let Some(source) = memory {
            let corrections = source.recent_corrections(MEMORY_HINTS_PER_SECTION);
            if !corrections.is_empty() {
                body.push_str("[USER CORRECTIONS]\n");
                for hint in &corrections {
                    body.push_str("- ");
                    body.push_str(&hint.text);
                    body.push('\n');
                }
                body.push('\n');
            }

            let patterns = source.recent_patterns(MEMORY_HINTS_PER_SECTION);
            if !patterns.is_empty() {
                body.push_str("[SUCCESSFUL PATTERNS]\n");
                for hint in &patterns {
                    body.push_str("- ");
                    body.push_str(&hint.text);
                    body.push('\n');
                }
                body.push('\n');
            }
        }

        body.push_str("To call a tool, emit a self-closing tag, e.g.:\n");
        for tool in tools.iter().take(4) {
            body.push_str(&format!(
                "<tool_call name=\"{}\" />\n",
                tool.name
            ));
        }
        if tools.is_empty() {
            body.push_str("<tool_call name=\"example_tool\" arg=\"value\" />\n");
        }

        let needed = template.system_open.len() + body.len() + template.system_close.len();
        let mut out = String::with_capacity(needed);
        out.push_str(template.system_open);
        out.push_str(&body);
        out.push_str(template.system_close);
        Ok(out)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn preamble(mode: PlatformMode) -> &'static str {
    match mode {
        PlatformMode::Mobile => {
            "You are a voice assistant. Be brief. Use tools when needed."
        }
        PlatformMode::Desktop => {
            "You are a local, on-device voice assistant. You reason step by \
             step and call tools to take action or look up facts. Only call \
             a tool when it is necessary to answer the user; otherwise \
             answer directly and concisely."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn echo_tool(name: &str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            format!("Echoes its input ({name})"),
            "{}",
            Arc::new(|args| Ok(args.to_string())),
        )
    }

    #[test]
    fn register_and_find() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).unwrap();

        let found = registry.find("echo").expect("tool should exist");
        assert_eq!(found.name, "echo");
        assert!(registry.find("missing").is_none());
    }

    #[test]
    fn duplicate_name_rejected() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).unwrap();
        let err = registry.register(echo_tool("echo")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let registry = ToolRegistry::new();
        for i in 0..20 {
            registry.register(echo_tool(&format!("tool_{i}"))).unwrap();
        }
        assert_eq!(registry.len(), 20);
    }

    #[test]
    fn dispatch_closure_invokes() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).unwrap();
        let tool = registry.find("echo").unwrap();
        let result = (tool.dispatch)(&json!({"x": 1}));
        assert_eq!(result.unwrap(), json!({"x": 1}).to_string());
    }

    #[test]
    fn build_system_prompt_includes_tools_and_exemplars() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("calculator_compute")).unwrap();
        let template = ethervox_template::TemplateCatalog::get(Some("qwen"), "");

        let prompt = registry
            .build_system_prompt(template, PlatformMode::Desktop, None)
            .unwrap();

        assert!(prompt.starts_with(template.system_open));
        assert!(prompt.ends_with(template.system_close));
        assert!(prompt.contains("calculator_compute"));
        assert!(prompt.contains("<tool_call name=\"calculator_compute\""));
    }

    struct FakeMemory {
        corrections: Vec<PromptMemoryHint>,
        patterns: Vec<PromptMemoryHint>,
    }

    impl CorrectionsSource for FakeMemory {
        fn recent_corrections(&self, limit: usize) -> Vec<PromptMemoryHint> {
            self.corrections.iter().take(limit).cloned().collect()
        }
        fn recent_patterns(&self, limit: usize) -> Vec<PromptMemoryHint> {
            self.patterns.iter().take(limit).cloned().collect()
        }
    }

    #[test]
    fn build_system_prompt_interpolates_memory_hints() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("memory_search")).unwrap();
        let template = ethervox_template::TemplateCatalog::get(Some("qwen"), "");

        let memory = FakeMemory {
            corrections: vec![PromptMemoryHint { text: "Don't use Celsius.".into() }],
            patterns: vec![PromptMemoryHint { text: "Searching memory for names works well.".into() }],
        };

        let prompt = registry
            .build_system_prompt(template, PlatformMode::Desktop, Some(&memory))
            .unwrap();

        assert!(prompt.contains("[USER CORRECTIONS]"));
        assert!(prompt.contains("Don't use Celsius."));
        assert!(prompt.contains("[SUCCESSFUL PATTERNS]"));
        assert!(prompt.contains("Searching memory for names works well."));
    }

    #[test]
    fn mobile_preamble_is_terser_than_desktop() {
        assert!(preamble(PlatformMode::Mobile).len() < preamble(PlatformMode::Desktop).len());
    }
}
